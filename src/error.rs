//! Error types for the pattern engine

use std::path::PathBuf;

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, PatternError>;

/// Pattern engine errors
///
/// Only directory-level load failures and explicit path compilation surface
/// here. Dangling references, cycles and bad query paths degrade to
/// placeholder values and are reported through [`crate::Diagnostics`].
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("Schema directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    #[error("Schema directory unreadable: {}: {source}", path.display())]
    DirectoryUnreadable {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("Invalid path expression '{path}': {message}")]
    InvalidPath { path: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config_crate::ConfigError),
}

impl PatternError {
    pub(crate) fn invalid_path(path: &str, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.to_string(),
            message: message.into(),
        }
    }
}
