//! Tracing subscriber setup.
//!
//! The library itself only emits `tracing` events. Hosts (and the CLI) call
//! [`init_logging`] once to print them to stderr or append them to a file.
//! `RUST_LOG`, when set, overrides the configured level.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::EnvFilter;

/// Level used when neither the config nor `RUST_LOG` says otherwise.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `scenepacer=debug`.
    pub level: String,
    /// Log file; stderr when `None`.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {reason}")]
    InvalidFilter { filter: String, reason: String },

    #[error("invalid log file path {0}")]
    InvalidPath(PathBuf),

    #[error("failed to create log directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

/// Keeps the background log writer alive. Drop it last.
#[must_use = "dropping the guard stops file logging"]
#[derive(Debug)]
pub struct LoggingGuard {
    _worker: Option<WorkerGuard>,
}

/// Build the filter: `RUST_LOG` if given, otherwise the configured level.
fn build_filter(env_directive: Option<&str>, level: &str) -> Result<EnvFilter, LoggingError> {
    let directive = env_directive
        .filter(|d| !d.trim().is_empty())
        .unwrap_or(level);
    EnvFilter::try_new(directive).map_err(|e| LoggingError::InvalidFilter {
        filter: directive.to_string(),
        reason: e.to_string(),
    })
}

/// Split a log file path into (directory, file name).
fn split_log_path(path: &Path) -> Result<(PathBuf, PathBuf), LoggingError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| LoggingError::InvalidPath(path.to_path_buf()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((directory, PathBuf::from(file_name)))
}

/// Install the global subscriber.
///
/// Returns [`LoggingError::AlreadyInitialized`] if any subscriber was
/// installed before.
pub fn init_logging(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let env_directive = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(env_directive.as_deref(), &config.level)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(LocalTime::rfc_3339())
        .with_target(true);

    let Some(path) = &config.file else {
        builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|_| LoggingError::AlreadyInitialized)?;
        return Ok(LoggingGuard { _worker: None });
    };

    let (directory, file_name) = split_log_path(path)?;
    std::fs::create_dir_all(&directory).map_err(|source| LoggingError::Io {
        path: directory.clone(),
        source,
    })?;

    let appender = tracing_appender::rolling::never(&directory, &file_name);
    let (writer, worker) = tracing_appender::non_blocking(appender);
    builder
        .with_ansi(false)
        .with_writer(writer)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    Ok(LoggingGuard {
        _worker: Some(worker),
    })
}
