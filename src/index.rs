//! The picture file cache and its reconciliation with the pictures directory.
//!
//! A [`PictureIndex`] is owned by exactly one task (see
//! [`crate::scheduler`]), so nothing in here is locked. Each call to
//! [`PictureIndex::reconcile`] lists the directory once and brings every
//! record up to date with what is on disk, doing as little tool work as
//! possible:
//!
//! - a source whose canonical sibling already exists is not converted again,
//! - a canonical file whose mtime has not moved past the recorded one is not
//!   extracted again.
//!
//! Failures for single files are logged and leave the previous record alone;
//! the next pass retries them.

use std::{
    cmp::Reverse,
    collections::{hash_map::Entry, HashMap, HashSet},
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use time::OffsetDateTime;
use tokio::fs;
use tracing::{debug, info, trace, warn};

use crate::{
    fsvisitor,
    snapshot::Picture,
    tools::{Converter, Coordinates, LocationExtractor, ToolError},
};

/// Extension every served picture has.
pub const PICTURES_FORMAT: &str = "png";

/// What we know about one source file.
#[derive(Debug, Clone, PartialEq)]
pub struct PictureFile {
    /// Name of the canonical file, relative to the pictures directory.
    pub filename: String,
    pub coordinates: Option<Coordinates>,
    /// Mtime of the canonical file when `coordinates` were read.
    pub last_modified: OffsetDateTime,
}

/// What happens to records whose source file disappeared.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Eviction {
    /// Keep them; the published list goes on showing the picture.
    #[default]
    Retain,
    /// Drop them at the end of the pass.
    DropMissing,
}

/// Counters for one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassSummary {
    pub seen: usize,
    pub converted: usize,
    pub extracted: usize,
    pub failed: usize,
    pub evicted: usize,
}

/// Without a listing there is nothing to reconcile against.
#[derive(Error, Debug)]
#[error("failed to read pictures directory {}: {source}", path.display())]
pub struct ScanError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

#[derive(Error, Debug)]
pub enum FileError {
    #[error("failed to convert {}: {source}", path.display())]
    Convert { path: PathBuf, source: ToolError },

    #[error("failed to stat {}: {source}", path.display())]
    Stat { path: PathBuf, source: io::Error },

    #[error("failed to extract location from {}: {source}", path.display())]
    Extract { path: PathBuf, source: ToolError },

    #[error("cannot serve {}: file name is not valid UTF-8", path.display())]
    Unservable { path: PathBuf },
}

#[derive(Default)]
struct FileOutcome {
    converted: bool,
    extracted: bool,
}

pub struct PictureIndex<C, E> {
    dir: PathBuf,
    converter: C,
    extractor: E,
    eviction: Eviction,
    files: HashMap<PathBuf, PictureFile>,
}

impl<C: Converter, E: LocationExtractor> PictureIndex<C, E> {
    pub fn new(dir: impl Into<PathBuf>, converter: C, extractor: E) -> Self {
        Self {
            dir: dir.into(),
            converter,
            extractor,
            eviction: Eviction::default(),
            files: HashMap::new(),
        }
    }

    pub fn with_eviction(mut self, eviction: Eviction) -> Self {
        self.eviction = eviction;
        self
    }

    /// Record for an absolute source path.
    pub fn get(&self, source: &Path) -> Option<&PictureFile> {
        self.files.get(source)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Every picture, in no particular order, as it is published.
    ///
    /// Several sources can share one canonical file (`a.jpg` and `a.jpeg`,
    /// or an orphaned `a.jpg` record next to `a.png`). Each filename is
    /// listed once, from its most recently extracted record.
    pub fn pictures(&self) -> Vec<Picture> {
        let mut by_name: HashMap<&str, (&Path, &PictureFile)> = HashMap::new();
        for (source, file) in &self.files {
            match by_name.entry(file.filename.as_str()) {
                Entry::Vacant(slot) => {
                    slot.insert((source.as_path(), file));
                }
                Entry::Occupied(mut slot) => {
                    let (kept_source, kept) = *slot.get();
                    let newer = (file.last_modified, Reverse(source.as_path()))
                        > (kept.last_modified, Reverse(kept_source));
                    if newer {
                        slot.insert((source.as_path(), file));
                    }
                }
            }
        }

        by_name
            .into_values()
            .map(|(_, file)| Picture::from(file))
            .collect()
    }

    /// One full pass over the pictures directory.
    ///
    /// Only a failure to list the directory is returned; everything else is
    /// logged and counted in [`PassSummary::failed`].
    pub async fn reconcile(&mut self) -> Result<PassSummary, ScanError> {
        let dir = fs::canonicalize(&self.dir)
            .await
            .map_err(|source| ScanError {
                path: self.dir.clone(),
                source,
            })?;
        let listing = fsvisitor::regular_files(&dir)
            .await
            .map_err(|source| ScanError {
                path: dir.clone(),
                source,
            })?;

        // `a.png` next to `a.jpg` is the conversion output of the latter and
        // is indexed under it.
        let derived: HashSet<PathBuf> = listing
            .iter()
            .filter(|path| !is_canonical(path))
            .map(|path| canonical_path(path))
            .collect();

        let mut summary = PassSummary::default();
        for source in &listing {
            if derived.contains(source) {
                trace!("Skipping derived {}", source.display());
                continue;
            }

            summary.seen += 1;
            match self.reconcile_file(source).await {
                Ok(outcome) => {
                    summary.converted += usize::from(outcome.converted);
                    summary.extracted += usize::from(outcome.extracted);
                }
                Err(e) => {
                    summary.failed += 1;
                    warn!("{e}");
                }
            }
        }

        if self.eviction == Eviction::DropMissing {
            let present: HashSet<&PathBuf> = listing.iter().collect();
            let before = self.files.len();
            self.files.retain(|source, _| {
                let keep = present.contains(source);
                if !keep {
                    debug!("Evicting {}", source.display());
                }
                keep
            });
            summary.evicted = before - self.files.len();
        }

        info!(
            "Pass over {}: seen {} converted {} extracted {} failed {} evicted {}, {} indexed",
            dir.display(),
            summary.seen,
            summary.converted,
            summary.extracted,
            summary.failed,
            summary.evicted,
            self.files.len()
        );

        Ok(summary)
    }

    async fn reconcile_file(&mut self, source: &Path) -> Result<FileOutcome, FileError> {
        let mut outcome = FileOutcome::default();

        let canonical = canonical_path(source);
        let Some(filename) = canonical.file_name().and_then(|name| name.to_str()) else {
            return Err(FileError::Unservable {
                path: source.to_owned(),
            });
        };
        let filename = filename.to_owned();

        if canonical != source && fs::metadata(&canonical).await.is_err() {
            debug!("Converting {}", source.display());
            if let Err(e) = self.converter.convert(source, &canonical).await {
                discard_partial(&canonical).await;
                return Err(FileError::Convert {
                    path: source.to_owned(),
                    source: e,
                });
            }
            outcome.converted = true;
        }

        let mtime = modified(&canonical)
            .await
            .map_err(|e| FileError::Stat {
                path: canonical.clone(),
                source: e,
            })?;

        if let Some(known) = self.files.get(source) {
            if mtime <= known.last_modified {
                trace!("Unchanged: {}", canonical.display());
                return Ok(outcome);
            }
        }

        let coordinates = self
            .extractor
            .extract_location(&canonical)
            .await
            .map_err(|e| FileError::Extract {
                path: canonical.clone(),
                source: e,
            })?;
        if coordinates.is_none() {
            debug!("No location in {}", canonical.display());
        }

        self.files.insert(
            source.to_owned(),
            PictureFile {
                filename,
                coordinates,
                last_modified: mtime,
            },
        );
        outcome.extracted = true;

        Ok(outcome)
    }
}

/// Whether `path` already has the canonical extension.
pub fn is_canonical(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == PICTURES_FORMAT)
}

/// Where the canonical version of `path` lives: same directory and stem.
pub fn canonical_path(path: &Path) -> PathBuf {
    if is_canonical(path) {
        path.to_owned()
    } else {
        path.with_extension(PICTURES_FORMAT)
    }
}

/// Remove whatever a failed conversion left at `dest`.
///
/// `dest` did not exist before the converter ran, so anything there is a
/// partial write that would otherwise pass for a finished conversion.
async fn discard_partial(dest: &Path) {
    match fs::remove_file(dest).await {
        Ok(()) => debug!("Removed partial {}", dest.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("failed to remove partial {}: {e}", dest.display()),
    }
}

async fn modified(path: &Path) -> io::Result<OffsetDateTime> {
    Ok(fs::metadata(path).await?.modified()?.into())
}
