// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{FreshenError, Result};

/// Load a configuration file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|e| FreshenError::io(path, e))?;

    let config: RawConfigFile = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// - Reads TOML.
/// - Applies defaults (handled by `serde` + `Default` impls).
/// - Checks pipelines and the `[watch]` section.
/// - Anchors relative paths at the config file's directory.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let path = path.as_ref();
    let raw_config = load_from_path(path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config.with_root(config_root_dir(path)))
}

/// Parse a config from an in-memory TOML string, anchored at `root`.
pub fn parse_str(contents: &str, root: impl Into<PathBuf>) -> Result<ConfigFile> {
    let raw: RawConfigFile = toml::from_str(contents)?;
    Ok(ConfigFile::try_from(raw)?.with_root(root))
}

/// Default config path: `Freshen.toml` in the current working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Freshen.toml")
}

/// Directory relative config paths are resolved against.
///
/// - "configs/Freshen.toml" → "configs"
/// - bare "Freshen.toml" (parent = "") → the current working directory
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}
