// src/config/model.rs

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::classify::{ClassifyRequest, ExcludeList};
use crate::errors::Result;
use crate::types::ExcludeMatchMode;

/// Configuration exactly as read from `Freshen.toml`, before validation.
///
/// ```toml
/// [watch]
/// path = "src"
/// timeout_ms = 200
///
/// [templates]
/// search_paths = ["src/templates"]
///
/// [pipeline.styles]
/// source = "src/scss"
/// source_extensions = [".scss"]
/// target = "public/css"
/// target_extension = ".css"
/// exclude = ["_"]
/// exclude_match = ["prefix"]
/// flatten = true
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub templates: TemplatesSection,

    /// All pipelines from `[pipeline.<name>]`.
    #[serde(default)]
    pub pipeline: BTreeMap<String, PipelineConfig>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holding one means the checks passed. Relative paths are resolved against
/// [`root`](Self::root).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub watch: WatchSection,
    pub templates: TemplatesSection,
    pub pipeline: BTreeMap<String, PipelineConfig>,
    root: PathBuf,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        watch: WatchSection,
        templates: TemplatesSection,
        pipeline: BTreeMap<String, PipelineConfig>,
    ) -> Self {
        Self {
            watch,
            templates,
            pipeline,
            root: PathBuf::from("."),
        }
    }

    /// Directory that relative paths in this config are relative to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = root.into();
        self
    }

    pub fn pipelines(&self) -> &BTreeMap<String, PipelineConfig> {
        &self.pipeline
    }

    /// Resolve a configured path against the config root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            crate::templates::normalize_path(&self.root.join(path))
        }
    }

    /// Template search paths, resolved, in configured order.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        self.templates
            .search_paths
            .iter()
            .map(|p| self.resolve(p))
            .collect()
    }

    /// Build the classifier input for one pipeline.
    pub fn classify_request(&self, pipeline: &PipelineConfig) -> Result<ClassifyRequest> {
        Ok(ClassifyRequest {
            source_dir: self.resolve(&pipeline.source),
            source_extensions: pipeline.source_extensions.clone(),
            target_dir: self.resolve(&pipeline.target),
            target_extension: pipeline.target_extension.clone(),
            exclude: ExcludeList::new(pipeline.exclude.clone(), &pipeline.exclude_match)?,
            flatten: pipeline.flatten,
        })
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Subpath of the config root to watch.
    #[serde(default = "default_watch_path")]
    pub path: PathBuf,

    /// Debounce window in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Watch subdirectories that exist when the watch starts.
    #[serde(default = "default_recursive")]
    pub recursive: bool,

    /// Label used in log lines.
    #[serde(default = "default_description")]
    pub description: String,
}

fn default_watch_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_timeout_ms() -> u64 {
    200
}

fn default_recursive() -> bool {
    true
}

fn default_description() -> String {
    "project".to_string()
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            path: default_watch_path(),
            timeout_ms: default_timeout_ms(),
            recursive: default_recursive(),
            description: default_description(),
        }
    }
}

impl WatchSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// `[templates]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TemplatesSection {
    /// Directories searched, in order, for `extends`/`include` references.
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
}

/// `[pipeline.<name>]` section: one source tree compiled into one target tree.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    pub source: PathBuf,

    /// With or without the leading dot.
    pub source_extensions: Vec<String>,

    pub target: PathBuf,

    pub target_extension: String,

    #[serde(default)]
    pub exclude: Vec<String>,

    /// How `exclude` entries match; empty means `["exact"]`.
    #[serde(default)]
    pub exclude_match: Vec<ExcludeMatchMode>,

    /// Put every output directly in `target`.
    #[serde(default)]
    pub flatten: bool,

    /// Sources are template pages: also consult the template graph so that a
    /// changed parent or include forces a rebuild.
    #[serde(default)]
    pub templates: bool,
}
