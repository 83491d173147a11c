//! The published, read-only view of the picture index.
//!
//! The scheduler replaces the whole list once per pass; HTTP handlers take a
//! cheap reference to whatever list is current. The lock only ever guards a
//! pointer swap or a pointer clone.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::index::PictureFile;

/// One entry of `GET /api/pictures`.
///
/// A picture without a known position is reported at `0, 0`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Picture {
    pub filename: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&PictureFile> for Picture {
    fn from(file: &PictureFile) -> Self {
        let (latitude, longitude) = file
            .coordinates
            .map(|c| (c.latitude, c.longitude))
            .unwrap_or_default();
        Self {
            filename: file.filename.clone(),
            latitude,
            longitude,
        }
    }
}

#[derive(Clone)]
pub struct Snapshot {
    published: Arc<Mutex<Arc<[Picture]>>>,
}

impl Snapshot {
    pub fn new() -> Self {
        Self {
            published: Arc::new(Mutex::new(Arc::from(Vec::new()))),
        }
    }

    /// Make `pictures` the list every following reader sees.
    pub fn publish(&self, pictures: Vec<Picture>) {
        let pictures: Arc<[Picture]> = pictures.into();
        let previous = std::mem::replace(&mut *self.lock(), pictures);
        // Freed outside the lock if we held the last reference.
        drop(previous);
    }

    /// The list published by the last completed pass.
    pub fn current(&self) -> Arc<[Picture]> {
        Arc::clone(&self.lock())
    }

    // A panicking writer can only have left a complete list behind.
    fn lock(&self) -> MutexGuard<'_, Arc<[Picture]>> {
        self.published
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Snapshot {
    fn default() -> Self {
        Self::new()
    }
}
