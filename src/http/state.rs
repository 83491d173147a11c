use std::{path::PathBuf, sync::Arc};

use crate::snapshot::Snapshot;

/// What every handler gets; cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub snapshot: Snapshot,
    pub pictures_dir: Arc<PathBuf>,
}

impl AppState {
    pub fn new(snapshot: Snapshot, pictures_dir: impl Into<PathBuf>) -> Self {
        Self {
            snapshot,
            pictures_dir: Arc::new(pictures_dir.into()),
        }
    }
}
