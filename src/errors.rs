// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid target key '{key}': {reason}")]
    InvalidTargetKey { key: String, reason: String },

    #[error("Base directory not set or not found: {0:?}")]
    MissingBaseDirectory(Option<PathBuf>),

    #[error("Source not found for target {target}: {path:?}")]
    SourceNotFound { target: String, path: PathBuf },

    #[error("Cycle detected in dependency graph: {0}")]
    DependencyCycle(String),

    #[error("Compilation failed for target {target}: {reason}")]
    CompilationFailed { target: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BuildError {
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        BuildError::InvalidTargetKey {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, BuildError>;
