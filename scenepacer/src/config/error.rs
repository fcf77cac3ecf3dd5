//! Configuration errors.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(String),

    #[error("invalid value '{value}' for {key} in [{section}]")]
    InvalidValue {
        section: &'static str,
        key: &'static str,
        value: String,
    },

    #[error("could not determine the home directory")]
    NoHomeDirectory,
}
