//! Stand-ins for the external tools, counting what they are asked to do.

#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::{Duration, SystemTime},
};

use async_trait::async_trait;
use geopics::tools::{Converter, Coordinates, LocationExtractor, ToolError};

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

fn refused(program: &str, path: &Path) -> ToolError {
    ToolError::Output {
        program: program.into(),
        reason: format!("refusing {}", path.display()),
    }
}

/// How the fake converter treats one source file.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mishap {
    /// Fail without touching the destination.
    Fail,
    /// Write part of the destination, then fail, like a killed `convert`.
    FailHalfway,
    /// Report success without writing anything.
    WriteNothing,
}

/// Copies the source to the destination, unless told otherwise for it.
#[derive(Clone, Default)]
pub struct FakeConverter {
    calls: Arc<Mutex<Vec<PathBuf>>>,
    mishaps: Arc<Mutex<HashMap<String, Mishap>>>,
}

impl FakeConverter {
    pub fn fail_on(&self, name: &str) {
        self.mishaps.lock().unwrap().insert(name.into(), Mishap::Fail);
    }

    pub fn fail_halfway_on(&self, name: &str) {
        self.mishaps
            .lock()
            .unwrap()
            .insert(name.into(), Mishap::FailHalfway);
    }

    pub fn write_nothing_for(&self, name: &str) {
        self.mishaps
            .lock()
            .unwrap()
            .insert(name.into(), Mishap::WriteNothing);
    }

    pub fn heal(&self, name: &str) {
        self.mishaps.lock().unwrap().remove(name);
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| file_name(p) == name)
            .count()
    }
}

#[async_trait]
impl Converter for FakeConverter {
    async fn convert(&self, source: &Path, dest: &Path) -> Result<(), ToolError> {
        self.calls.lock().unwrap().push(source.to_owned());
        let mishap = self.mishaps.lock().unwrap().get(&file_name(source)).copied();
        match mishap {
            Some(Mishap::Fail) => return Err(refused("fake-convert", source)),
            Some(Mishap::FailHalfway) => {
                tokio::fs::write(dest, b"half").await.unwrap();
                return Err(refused("fake-convert", source));
            }
            Some(Mishap::WriteNothing) => return Ok(()),
            None => {}
        }
        tokio::fs::copy(source, dest)
            .await
            .map_err(|source| ToolError::Spawn {
                program: "fake-convert".into(),
                source,
            })?;
        Ok(())
    }
}

/// Answers from a table keyed by file name; unknown files have no position.
#[derive(Clone, Default)]
pub struct FakeExtractor {
    calls: Arc<Mutex<Vec<PathBuf>>>,
    positions: Arc<Mutex<HashMap<String, Coordinates>>>,
    failing: Arc<Mutex<HashSet<String>>>,
}

impl FakeExtractor {
    pub fn locate(&self, name: &str, latitude: f64, longitude: f64) {
        self.positions.lock().unwrap().insert(
            name.into(),
            Coordinates {
                latitude,
                longitude,
            },
        );
    }

    pub fn fail_on(&self, name: &str) {
        self.failing.lock().unwrap().insert(name.into());
    }

    pub fn heal(&self, name: &str) {
        self.failing.lock().unwrap().remove(name);
    }

    pub fn calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|p| file_name(p) == name)
            .count()
    }
}

#[async_trait]
impl LocationExtractor for FakeExtractor {
    async fn extract_location(&self, path: &Path) -> Result<Option<Coordinates>, ToolError> {
        self.calls.lock().unwrap().push(path.to_owned());
        let name = file_name(path);
        if self.failing.lock().unwrap().contains(&name) {
            return Err(refused("fake-exiftool", path));
        }
        Ok(self.positions.lock().unwrap().get(&name).copied())
    }
}

pub fn write(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, contents).unwrap();
    path
}

/// Move the mtime of `path` into the future, as an edit would.
pub fn touch(path: &Path) {
    let later = SystemTime::now() + Duration::from_secs(60);
    std::fs::File::options()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(later)
        .unwrap();
}
