#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use freshen::config::{ConfigFile, PipelineConfig, RawConfigFile, TemplatesSection, WatchSection};
use freshen::types::ExcludeMatchMode;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
    root: PathBuf,
}

impl ConfigFileBuilder {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            config: RawConfigFile {
                watch: WatchSection::default(),
                templates: TemplatesSection::default(),
                pipeline: BTreeMap::new(),
            },
            root: root.into(),
        }
    }

    pub fn with_pipeline(mut self, name: &str, pipeline: PipelineConfig) -> Self {
        self.config.pipeline.insert(name.to_string(), pipeline);
        self
    }

    pub fn with_search_path(mut self, path: &str) -> Self {
        self.config.templates.search_paths.push(PathBuf::from(path));
        self
    }

    pub fn watch_path(mut self, path: &str) -> Self {
        self.config.watch.path = PathBuf::from(path);
        self
    }

    pub fn timeout_ms(mut self, ms: u64) -> Self {
        self.config.watch.timeout_ms = ms;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config)
            .expect("Failed to build valid config from builder")
            .with_root(self.root)
    }
}

/// Builder for `PipelineConfig`.
pub struct PipelineConfigBuilder {
    pipeline: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn new(source: &str, source_ext: &str, target: &str, target_ext: &str) -> Self {
        Self {
            pipeline: PipelineConfig {
                source: PathBuf::from(source),
                source_extensions: vec![source_ext.to_string()],
                target: PathBuf::from(target),
                target_extension: target_ext.to_string(),
                exclude: vec![],
                exclude_match: vec![],
                flatten: false,
                templates: false,
            },
        }
    }

    pub fn extension(mut self, ext: &str) -> Self {
        self.pipeline.source_extensions.push(ext.to_string());
        self
    }

    pub fn exclude(mut self, entry: &str) -> Self {
        self.pipeline.exclude.push(entry.to_string());
        self
    }

    pub fn exclude_match(mut self, mode: ExcludeMatchMode) -> Self {
        self.pipeline.exclude_match.push(mode);
        self
    }

    pub fn flatten(mut self, val: bool) -> Self {
        self.pipeline.flatten = val;
        self
    }

    pub fn templates(mut self, val: bool) -> Self {
        self.pipeline.templates = val;
        self
    }

    pub fn build(self) -> PipelineConfig {
        self.pipeline
    }
}
