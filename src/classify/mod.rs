// src/classify/mod.rs

//! Source → target change classification.
//!
//! Given a source tree, an extension filter and a target directory, decide
//! for every source file whether its output is `new`, `modified` or
//! `unchanged`. The verdict is purely timestamp based; nothing is hashed and
//! nothing is persisted between passes.

pub mod classifier;
pub mod exclude;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::types::{ChangeStatus, Timestamp};

pub use classifier::classify;
pub use exclude::ExcludeList;

/// Everything one `classify` pass needs.
#[derive(Debug, Clone)]
pub struct ClassifyRequest {
    pub source_dir: PathBuf,
    /// Accepted with or without the leading dot (`"scss"` or `".scss"`).
    pub source_extensions: Vec<String>,
    pub target_dir: PathBuf,
    pub target_extension: String,
    pub exclude: ExcludeList,
    /// Put every target directly in `target_dir` instead of mirroring the
    /// source's subdirectories.
    pub flatten: bool,
}

impl ClassifyRequest {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        source_extensions: &[&str],
        target_dir: impl Into<PathBuf>,
        target_extension: &str,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            source_extensions: source_extensions.iter().map(|s| s.to_string()).collect(),
            target_dir: target_dir.into(),
            target_extension: target_extension.to_string(),
            exclude: ExcludeList::empty(),
            flatten: false,
        }
    }

    pub fn with_exclude(mut self, exclude: ExcludeList) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn flatten(mut self, flatten: bool) -> Self {
        self.flatten = flatten;
        self
    }
}

/// A source file as seen by one classification pass.
///
/// The timestamp is read once when the file is discovered and never
/// refreshed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path relative to the classified source root, forward slashes.
    pub relative: String,
    /// Directory that directly contains the file.
    pub dir: PathBuf,
    pub file_name: String,
    /// The matched extension, always with a leading dot.
    pub extension: String,
    pub modified: Timestamp,
}

impl SourceFile {
    pub fn path(&self) -> PathBuf {
        self.dir.join(&self.file_name)
    }

    /// File name with the matched extension removed.
    pub fn stem(&self) -> &str {
        self.file_name
            .strip_suffix(self.extension.as_str())
            .unwrap_or(&self.file_name)
    }
}

/// Staleness verdict for one source/target pair.
///
/// Invariant: `status` is derived from the two timestamps exactly as
/// [`ChangeStatus::from_timestamps`] does, with an absent target recorded as
/// `target_modified == 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangeRecord {
    pub relative: String,
    pub source_path: PathBuf,
    pub source_dir: PathBuf,
    pub source_extension: String,
    pub source_modified: Timestamp,
    pub target_path: PathBuf,
    pub target_dir: PathBuf,
    pub target_extension: String,
    pub target_modified: Timestamp,
    pub status: ChangeStatus,
}

impl ChangeRecord {
    pub fn source_file_name(&self) -> &str {
        file_name_str(&self.source_path)
    }

    pub fn target_exists(&self) -> bool {
        self.status != ChangeStatus::New
    }
}

fn file_name_str(path: &Path) -> &str {
    path.file_name().and_then(|n| n.to_str()).unwrap_or_default()
}

/// Normalize an extension to carry exactly one leading dot.
pub fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        return String::new();
    }
    format!(".{trimmed}")
}
