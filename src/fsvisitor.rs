//! Listing of the pictures directory

use std::{io, path::Path, path::PathBuf};

use async_walkdir::{Filtering, WalkDir};
use futures_lite::stream::StreamExt;
use tracing::trace;

/// Regular files directly inside `dir`.
///
/// Subdirectories are not descended into, and symlinks and other special
/// entries are left out. Any error while reading `dir` is returned as is;
/// the caller has no partial listing to work with.
pub async fn regular_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = WalkDir::new(dir).filter(|entry| async move {
        match entry.file_type().await {
            Ok(file_type) if file_type.is_file() => Filtering::Continue,
            Ok(file_type) if file_type.is_dir() => {
                trace!("Not descending into {}", entry.path().display());
                Filtering::IgnoreDir
            }
            Ok(_) => {
                trace!("Discarded on walk: {}", entry.path().display());
                Filtering::Ignore
            }
            Err(e) => {
                trace!("Discarded on walk: {} ({e})", entry.path().display());
                Filtering::Ignore
            }
        }
    });

    let mut files = vec![];
    while let Some(entry) = entries.next().await {
        files.push(entry?.path());
    }

    Ok(files)
}
