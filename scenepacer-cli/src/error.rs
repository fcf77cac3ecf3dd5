//! CLI error type.

use std::path::PathBuf;

use scenepacer::config::ConfigError;
use scenepacer::runtime::RuntimeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid anchor file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Runtime(String),

    #[error("invalid input: {0}")]
    Input(String),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        CliError::Config(err.to_string())
    }
}

impl From<RuntimeError> for CliError {
    fn from(err: RuntimeError) -> Self {
        CliError::Runtime(err.to_string())
    }
}
