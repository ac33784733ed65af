// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum FreshenError {
    #[error("Path not found: {0:?}")]
    PathNotFound(PathBuf),

    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Unsupported expression: {0}")]
    UnsupportedExpression(String),

    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FreshenError {
    /// Attach the offending path to an `std::io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FreshenError::Io {
            path: path.into(),
            source,
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, FreshenError>;
