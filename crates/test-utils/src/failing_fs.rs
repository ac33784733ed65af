use std::io;
use std::path::{Path, PathBuf};

use freshen::errors::{FreshenError, Result};
use freshen::fs::mock::MockFileSystem;
use freshen::fs::FileSystem;
use freshen::types::Timestamp;

/// A `MockFileSystem` whose `modified()` fails for selected paths while
/// every other call (including `exists()`) still succeeds.
#[derive(Debug, Clone)]
pub struct FailingStatFs {
    inner: MockFileSystem,
    broken: Vec<PathBuf>,
}

impl FailingStatFs {
    pub fn new(inner: MockFileSystem) -> Self {
        Self {
            inner,
            broken: Vec::new(),
        }
    }

    pub fn fail_stat(mut self, path: impl Into<PathBuf>) -> Self {
        self.broken.push(path.into());
        self
    }
}

impl FileSystem for FailingStatFs {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        self.inner.read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.inner.is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }

    fn modified(&self, path: &Path) -> Result<Timestamp> {
        if self.broken.iter().any(|p| p == path) {
            return Err(FreshenError::io(
                path,
                io::Error::new(io::ErrorKind::PermissionDenied, "stat denied"),
            ));
        }
        self.inner.modified(path)
    }

    fn read_dir(&self, path: &Path) -> Result<Vec<PathBuf>> {
        self.inner.read_dir(path)
    }
}
