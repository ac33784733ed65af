// src/config/validate.rs

use crate::classify::ExcludeList;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{FreshenError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::FreshenError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw.watch, raw.templates, raw.pipeline))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    ensure_has_pipelines(cfg)?;
    validate_watch(cfg)?;
    validate_pipelines(cfg)?;
    Ok(())
}

fn ensure_has_pipelines(cfg: &RawConfigFile) -> Result<()> {
    if cfg.pipeline.is_empty() {
        return Err(FreshenError::ConfigError(
            "config must contain at least one [pipeline.<name>] section".to_string(),
        ));
    }
    Ok(())
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    if cfg.watch.timeout_ms == 0 {
        return Err(FreshenError::ConfigError(
            "[watch].timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_pipelines(cfg: &RawConfigFile) -> Result<()> {
    for (name, pipeline) in cfg.pipeline.iter() {
        let has_extension = pipeline
            .source_extensions
            .iter()
            .any(|ext| !ext.trim().trim_start_matches('.').is_empty());
        if !has_extension {
            return Err(FreshenError::ConfigError(format!(
                "pipeline '{}' needs at least one non-empty entry in `source_extensions`",
                name
            )));
        }

        if pipeline.target_extension.trim().trim_start_matches('.').is_empty() {
            return Err(FreshenError::ConfigError(format!(
                "pipeline '{}' has an empty `target_extension`",
                name
            )));
        }

        // Compile once so that bad globs surface at load time.
        ExcludeList::new(pipeline.exclude.clone(), &pipeline.exclude_match).map_err(|e| {
            FreshenError::ConfigError(format!("pipeline '{}': {}", name, e))
        })?;
    }
    Ok(())
}
