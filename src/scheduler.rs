//! The background task keeping the published snapshot up to date

use std::time::Duration;

use tokio::{sync::watch, time};
use tracing::{info, info_span, Instrument};

use crate::{
    index::{PassSummary, PictureIndex, ScanError},
    snapshot::Snapshot,
    tools::{Converter, LocationExtractor},
};

/// Pause between two passes unless configured otherwise.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Sole owner of the [`PictureIndex`] and sole writer of the [`Snapshot`].
pub struct Scheduler<C, E> {
    index: PictureIndex<C, E>,
    snapshot: Snapshot,
    interval: Duration,
    passes: u64,
}

impl<C: Converter, E: LocationExtractor> Scheduler<C, E> {
    pub fn new(index: PictureIndex<C, E>, snapshot: Snapshot, interval: Duration) -> Self {
        Self {
            index,
            snapshot,
            interval,
            passes: 0,
        }
    }

    pub fn index(&self) -> &PictureIndex<C, E> {
        &self.index
    }

    /// Reconcile once and publish the result, however many files failed.
    pub async fn run_once(&mut self) -> Result<PassSummary, ScanError> {
        self.passes += 1;
        let span = info_span!("scan", pass = self.passes);

        async {
            let summary = self.index.reconcile().await?;
            self.snapshot.publish(self.index.pictures());
            Ok(summary)
        }
        .instrument(span)
        .await
    }

    /// Pass, sleep, repeat until `shutdown` changes or its sender goes away.
    ///
    /// The first pass starts right away. A pass in progress is never
    /// interrupted. Returns early only when the directory cannot be listed.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> Result<(), ScanError> {
        info!("Scanning every {:?}", self.interval);
        loop {
            self.run_once().await?;

            tokio::select! {
                _ = time::sleep(self.interval) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!("Scanning stopped after {} passes", self.passes);
        Ok(())
    }
}
