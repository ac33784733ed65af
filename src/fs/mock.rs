// src/fs/mock.rs

use super::FileSystem;
use crate::errors::{FreshenError, Result};
use crate::types::Timestamp;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Clone)]
pub enum MockEntry {
    File { content: Vec<u8>, modified: Timestamp },
    Dir(Vec<String>), // List of child names, in insertion order
}

/// In-memory filesystem with explicit modification times.
///
/// Directory listings come back in insertion order, which gives tests a
/// deterministic enumeration order.
#[derive(Debug, Clone, Default)]
pub struct MockFileSystem {
    files: Arc<Mutex<HashMap<PathBuf, MockEntry>>>,
}

impl MockFileSystem {
    pub fn new() -> Self {
        let mut files = HashMap::new();
        // Ensure root exists
        files.insert(PathBuf::from("."), MockEntry::Dir(Vec::new()));

        Self {
            files: Arc::new(Mutex::new(files)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, MockEntry>> {
        // A poisoned lock only means another test thread panicked mid-insert.
        self.files.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Add (or replace) a file with the given contents and mtime.
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<Vec<u8>>, modified: Timestamp) {
        let path = path.as_ref().to_path_buf();
        let mut files = self.lock();
        files.insert(
            path.clone(),
            MockEntry::File {
                content: content.into(),
                modified,
            },
        );
        Self::link_to_parent(&mut files, &path);
    }

    /// Create an empty directory (and its parents).
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        let mut files = self.lock();
        Self::ensure_dir_entry(&mut files, path.as_ref());
    }

    /// Change the mtime of an existing file. Returns false if it does not exist.
    pub fn set_modified(&self, path: impl AsRef<Path>, at: Timestamp) -> bool {
        let mut files = self.lock();
        match files.get_mut(path.as_ref()) {
            Some(MockEntry::File { modified, .. }) => {
                *modified = at;
                true
            }
            _ => false,
        }
    }

    /// Remove a file or an (empty or not) directory entry.
    pub fn remove(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let mut files = self.lock();
        files.remove(path);
        if let (Some(parent), Some(name)) = (path.parent(), path.file_name()) {
            let parent = if parent.as_os_str().is_empty() {
                Path::new(".")
            } else {
                parent
            };
            if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
                let name = name.to_string_lossy();
                children.retain(|c| *c != name);
            }
        }
    }

    fn link_to_parent(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        let Some(parent) = path.parent() else {
            return;
        };
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        if parent == path {
            return;
        }

        Self::ensure_dir_entry(files, parent);
        if let Some(MockEntry::Dir(children)) = files.get_mut(parent) {
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
    }

    fn ensure_dir_entry(files: &mut HashMap<PathBuf, MockEntry>, path: &Path) {
        if files.contains_key(path) {
            return;
        }
        files.insert(path.to_path_buf(), MockEntry::Dir(Vec::new()));
        Self::link_to_parent(files, path);
    }
}

fn not_found(path: &Path) -> FreshenError {
    FreshenError::io(path, io::Error::new(io::ErrorKind::NotFound, "no such mock entry"))
}

impl FileSystem for MockFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let files = self.lock();
        match files.get(path) {
            Some(MockEntry::File { content, .. }) => String::from_utf8(content.clone())
                .map_err(|e| FreshenError::io(path, io::Error::new(io::ErrorKind::InvalidData, e))),
            Some(MockEntry::Dir(_)) => Err(FreshenError::io(
                path,
                io::Error::new(io::ErrorKind::IsADirectory, "is a directory"),
            )),
            None => Err(not_found(path)),
        }
    }

    fn exists(&self, path: &Path) -> bool {
        self.lock().contains_key(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::File { .. }))
    }

    fn is_dir(&self, path: &Path) -> bool {
        matches!(self.lock().get(path), Some(MockEntry::Dir(_)))
    }

    fn modified(&self, path: &Path) -> Result<Timestamp> {
        match self.lock().get(path) {
            Some(MockEntry::File { modified, .. }) => Ok(*modified),
            Some(MockEntry::Dir(_)) => Ok(0),
            None => Err(not_found(path)),
        }
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        match self.lock().get(path) {
            Some(MockEntry::Dir(children)) => {
                Ok(children.iter().map(|name| path.join(name)).collect())
            }
            _ => Err(not_found(path)),
        }
    }
}
