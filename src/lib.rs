use std::future::IntoFuture;

use anyhow::Context;
use tokio::{
    fs,
    net::TcpListener,
    signal,
    sync::watch,
};
use tracing::info;

pub mod config;
pub mod fsvisitor;
pub mod http;
pub mod index;
pub mod scheduler;
pub mod snapshot;
pub mod tools;

use config::Config;
use http::AppState;
use index::PictureIndex;
use scheduler::Scheduler;
use snapshot::Snapshot;
use tools::{ExifTool, MagickConvert};

/// Index the pictures directory in the background and serve it until asked
/// to stop.
///
/// Fails early if the directory cannot be created or the address cannot be
/// bound, and later if the directory can no longer be listed.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    fs::create_dir_all(&config.pictures_dir)
        .await
        .with_context(|| {
            format!(
                "creating pictures directory {}",
                config.pictures_dir.display()
            )
        })?;

    let snapshot = Snapshot::new();
    let index = PictureIndex::new(
        config.pictures_dir.clone(),
        MagickConvert::new(&config.converter, config.tool_timeout()),
        ExifTool::new(&config.extractor, config.tool_timeout()),
    )
    .with_eviction(config.eviction());
    let scheduler = Scheduler::new(index, snapshot.clone(), config.scan_interval());

    let (stop_scanning, stop_requested) = watch::channel(false);
    let mut scanning = tokio::spawn(scheduler.run(stop_requested));

    let app = http::router(AppState::new(snapshot, config.pictures_dir.clone()));
    let listener = TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding to {}", config.listen))?;
    info!(
        "Serving {} on {}",
        config.pictures_dir.display(),
        config.listen
    );

    let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal());
    tokio::select! {
        served = server.into_future() => served.context("serving http")?,
        scanned = &mut scanning => {
            // The scheduler only returns on its own when it cannot go on.
            scanned.context("scheduler task")??;
            return Ok(());
        }
    }

    let _ = stop_scanning.send(true);
    scanning.await.context("scheduler task")??;
    info!("Shut down");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
        info!("Received SIGTERM, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
