// src/fs/mod.rs

use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::errors::{FreshenError, Result};
use crate::types::Timestamp;

pub mod mock;

/// Abstract filesystem interface.
///
/// This is the only way the classifier, the template graph and the watcher
/// look at the disk. Nothing here writes: timestamps are read, never touched.
pub trait FileSystem: Send + Sync + Debug {
    fn read_to_string(&self, path: &Path) -> Result<String>;
    fn exists(&self, path: &Path) -> bool;
    fn is_file(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;

    /// Last-modified time of `path` in epoch milliseconds.
    fn modified(&self, path: &Path) -> Result<Timestamp>;

    /// Return a list of entries in a directory.
    /// Returns full paths, in the order the underlying filesystem lists them.
    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>>;
}

/// Implementation that uses `std::fs`.
#[derive(Debug, Clone, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| FreshenError::io(path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn modified(&self, path: &Path) -> Result<Timestamp> {
        let mtime = fs::metadata(path)
            .and_then(|m| m.modified())
            .map_err(|e| FreshenError::io(path, e))?;
        Ok(system_time_to_millis(mtime))
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| FreshenError::io(path, e))? {
            let entry = entry.map_err(|e| FreshenError::io(path, e))?;
            entries.push(entry.path());
        }
        Ok(entries)
    }
}

/// Convert a `SystemTime` into epoch milliseconds, clamping pre-epoch times to 0.
pub fn system_time_to_millis(time: SystemTime) -> Timestamp {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or(0)
}
