//! Run a single scan over a directory with the real tools and print what
//! would be published.

use std::path::PathBuf;

use anyhow::Context;
use geopics::{
    index::PictureIndex,
    tools::{ExifTool, MagickConvert},
};
use tracing::info;
use tracing_subscriber::{
    fmt, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so stdout stays valid json.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let dir: PathBuf = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .context("usage: visit <pictures-dir>")?;

    let mut index = PictureIndex::new(dir, MagickConvert::default(), ExifTool::default());
    let summary = index.reconcile().await?;
    info!("{summary:?}");

    println!("{}", serde_json::to_string_pretty(&index.pictures())?);
    Ok(())
}
