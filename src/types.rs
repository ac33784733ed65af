use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Modification time in milliseconds since the Unix epoch.
///
/// A file that does not exist is treated as having timestamp `0`.
pub type Timestamp = u64;

/// Staleness verdict for a single source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeStatus {
    /// No target exists yet.
    New,
    /// Target exists but the source is strictly newer.
    Modified,
    /// Target exists and is at least as new as the source.
    Unchanged,
}

impl ChangeStatus {
    /// Classify a source against an optional target timestamp.
    ///
    /// Equal timestamps are `Unchanged`: only a strictly newer source is
    /// considered modified.
    pub fn from_timestamps(source: Timestamp, target: Option<Timestamp>) -> Self {
        match target {
            None => ChangeStatus::New,
            Some(t) if source > t => ChangeStatus::Modified,
            Some(_) => ChangeStatus::Unchanged,
        }
    }

    pub fn needs_build(self) -> bool {
        !matches!(self, ChangeStatus::Unchanged)
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ChangeStatus::New => "new",
            ChangeStatus::Modified => "modified",
            ChangeStatus::Unchanged => "unchanged",
        };
        f.write_str(s)
    }
}

/// Kind of a settled watch notification.
///
/// - `Rename`: a path appeared, disappeared or was renamed.
/// - `Change`: the contents or metadata of an existing path changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Rename,
    Change,
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChangeKind::Rename => f.write_str("rename"),
            ChangeKind::Change => f.write_str("change"),
        }
    }
}

/// How an `exclude` entry is compared against a candidate source path.
///
/// Every enabled mode is tried against both the forward-slash relative path
/// and the file's basename; any hit excludes the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExcludeMatchMode {
    Exact,
    Substring,
    Prefix,
    Suffix,
    Glob,
}

impl FromStr for ExcludeMatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Ok(ExcludeMatchMode::Exact),
            "substring" => Ok(ExcludeMatchMode::Substring),
            "prefix" => Ok(ExcludeMatchMode::Prefix),
            "suffix" => Ok(ExcludeMatchMode::Suffix),
            "glob" => Ok(ExcludeMatchMode::Glob),
            other => Err(format!(
                "invalid exclude match mode: {other} (expected exact, substring, prefix, suffix or glob)"
            )),
        }
    }
}
