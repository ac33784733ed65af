// src/templates/mod.rs

//! Template dependency graph.
//!
//! A page's rendered output depends on its own source, on every template up
//! its `extends` chain, and on every fragment any of those templates
//! `include`s. [`TemplateGraph`] parses those relationships lazily, caches
//! them per normalized path for the lifetime of one build session, and
//! answers "is this page stale relative to a timestamp".

pub mod expr;
pub mod graph;
pub mod parser;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::types::Timestamp;

pub use graph::TemplateGraph;

/// A resolved reference to another template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateRef {
    /// The search path (or owning directory) the reference was found in.
    pub dir: PathBuf,
    /// The reference exactly as written in the tag.
    pub filename: String,
    /// Normalized `dir/filename`; also the cache key.
    pub path: PathBuf,
}

/// A resolved `include`, with the fragment's mtime at parse time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IncludeRef {
    pub dir: PathBuf,
    pub filename: String,
    pub path: PathBuf,
    pub last_modified: Timestamp,
}

/// Non-staleness data pulled out on demand for other tooling.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateMetadata {
    pub blocks: Vec<String>,
    pub variables: BTreeMap<String, serde_json::Value>,
}

/// One cached template.
#[derive(Debug, Clone, Serialize)]
pub struct TemplateRecord {
    pub path: PathBuf,
    pub dir: PathBuf,
    pub filename: String,
    /// File contents as read.
    pub raw: String,
    /// `raw`, or `raw` without `extends`/`include` tags once stripping was requested.
    pub content: String,
    pub last_modified: Timestamp,
    pub extends: Option<TemplateRef>,
    pub includes: Vec<IncludeRef>,
    /// Set by the last staleness query on this record when something other
    /// than the record's own file made it stale.
    pub changed_ancestor: Option<PathBuf>,
    pub(crate) includes_extracted: bool,
    pub(crate) stripped: bool,
    pub(crate) metadata: Option<TemplateMetadata>,
}

impl TemplateRecord {
    pub fn includes_extracted(&self) -> bool {
        self.includes_extracted
    }

    pub fn is_stripped(&self) -> bool {
        self.stripped
    }

    pub fn metadata(&self) -> Option<&TemplateMetadata> {
        self.metadata.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferenceKind {
    Extends,
    Include,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Extends => f.write_str("extends"),
            ReferenceKind::Include => f.write_str("include"),
        }
    }
}

/// A reference that was treated as a missing edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolutionWarning {
    pub template: PathBuf,
    pub reference: String,
    pub kind: ReferenceKind,
    pub reason: String,
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} \"{}\" in {:?}: {}",
            self.kind, self.reference, self.template, self.reason
        )
    }
}

/// Lexically normalize a path: drop `.` components and fold `..` into the
/// preceding component. Does not touch the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let popped = matches!(out.components().next_back(), Some(Component::Normal(_)))
                    && out.pop();
                if !popped && !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}
