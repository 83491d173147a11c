use clap::Parser;
use geopics::config::Config;
use tracing::debug;
use tracing_subscriber::{
    fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Subscribe to traces
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env()) // Read trace levels from RUST_LOG env var
        .init();

    let config = Config::parse();
    debug!("{config:?}");

    geopics::serve(config).await
}
