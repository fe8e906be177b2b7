//! Artifact storage and per-path writer serialization

use crate::error::{ForecastError, Result};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Durable bytes keyed by path
pub trait ArtifactStore: Send + Sync + std::fmt::Debug {
    /// Read the bytes at `path`; a missing path is `ArtifactNotFound`
    fn read(&self, path: &Path) -> Result<Vec<u8>>;

    /// Replace whatever is stored at `path` with `bytes`
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    fn exists(&self, path: &Path) -> bool;
}

/// Artifacts stored as files on the local filesystem
#[derive(Debug, Clone, Default)]
pub struct FileArtifactStore;

impl FileArtifactStore {
    pub fn new() -> Self {
        Self
    }
}

impl ArtifactStore for FileArtifactStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        match fs::read(path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ForecastError::ArtifactNotFound(path.to_path_buf()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        // Readers only ever see the old file or the complete new one
        let mut tmp_name = path.as_os_str().to_owned();
        tmp_name.push(".tmp");
        let tmp_path = PathBuf::from(tmp_name);

        let mut file = fs::File::create(&tmp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&tmp_path, path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "wrote artifact");
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }
}

/// Artifacts held in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryArtifactStore {
    entries: Arc<RwLock<HashMap<PathBuf, Vec<u8>>>>,
}

impl MemoryArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored artifacts
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Stored paths in sorted order
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.entries.read().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl ArtifactStore for MemoryArtifactStore {
    fn read(&self, path: &Path) -> Result<Vec<u8>> {
        self.entries
            .read()
            .get(path)
            .cloned()
            .ok_or_else(|| ForecastError::ArtifactNotFound(path.to_path_buf()))
    }

    fn write(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        self.entries.write().insert(path.to_path_buf(), bytes.to_vec());
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.entries.read().contains_key(path)
    }
}

/// One mutex per artifact path, so at most one writer works on a path at a time
#[derive(Debug, Default)]
pub struct PathLocks {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl PathLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock handle for `path`; callers hold `handle.lock()` while writing
    pub fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .entry(path.to_path_buf())
            .or_default()
            .clone()
    }
}
