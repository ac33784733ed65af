// src/classify/exclude.rs

use std::fmt;

use anyhow::Context;
use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::{FreshenError, Result};
use crate::types::ExcludeMatchMode;

/// Compiled `exclude` list for one classification request.
///
/// Each entry is tested with every enabled [`ExcludeMatchMode`] against both
/// the forward-slash relative path (e.g. `"partials/_mixin.scss"`) and the
/// basename (`"_mixin.scss"`).
#[derive(Clone, Default)]
pub struct ExcludeList {
    entries: Vec<String>,
    modes: Vec<ExcludeMatchMode>,
    glob_set: Option<GlobSet>,
}

impl fmt::Debug for ExcludeList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExcludeList")
            .field("entries", &self.entries)
            .field("modes", &self.modes)
            .finish_non_exhaustive()
    }
}

impl ExcludeList {
    /// Build an exclude list. An empty `modes` slice means `[Exact]`.
    pub fn new(entries: Vec<String>, modes: &[ExcludeMatchMode]) -> Result<Self> {
        let modes: Vec<ExcludeMatchMode> = if modes.is_empty() {
            vec![ExcludeMatchMode::Exact]
        } else {
            let mut unique = Vec::with_capacity(modes.len());
            for mode in modes {
                if !unique.contains(mode) {
                    unique.push(*mode);
                }
            }
            unique
        };

        let glob_set = if modes.contains(&ExcludeMatchMode::Glob) && !entries.is_empty() {
            Some(build_globset(&entries).map_err(FreshenError::Other)?)
        } else {
            None
        };

        Ok(Self {
            entries,
            modes,
            glob_set,
        })
    }

    /// An exclude list that never matches.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn modes(&self) -> &[ExcludeMatchMode] {
        &self.modes
    }

    /// Returns true if the file should be skipped.
    pub fn is_excluded(&self, rel_path: &str, basename: &str) -> bool {
        if self.entries.is_empty() {
            return false;
        }
        self.modes.iter().any(|mode| match mode {
            ExcludeMatchMode::Glob => self
                .glob_set
                .as_ref()
                .is_some_and(|set| set.is_match(rel_path) || set.is_match(basename)),
            textual => self.entries.iter().any(|entry| {
                matches_textual(*textual, entry, rel_path) || matches_textual(*textual, entry, basename)
            }),
        })
    }
}

fn matches_textual(mode: ExcludeMatchMode, entry: &str, candidate: &str) -> bool {
    match mode {
        ExcludeMatchMode::Exact => candidate == entry,
        ExcludeMatchMode::Substring => candidate.contains(entry),
        ExcludeMatchMode::Prefix => candidate.starts_with(entry),
        ExcludeMatchMode::Suffix => candidate.ends_with(entry),
        ExcludeMatchMode::Glob => false,
    }
}

fn build_globset(patterns: &[String]) -> anyhow::Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let glob = Glob::new(pat).with_context(|| format!("invalid exclude glob: {pat}"))?;
        builder.add(glob);
    }
    Ok(builder.build()?)
}
