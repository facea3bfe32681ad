//! Tracing subscriber initialization.
//!
//! The headless binary writes its report to stdout, so logs go to a file by
//! default. Follow them with `tail -f` in a separate terminal. `--log-stderr`
//! switches to stderr for one-off debugging.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Error type for logging initialization failures.
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to create log directory
    #[error("Failed to create log directory at {path:?}: {source}")]
    DirectoryCreation {
        /// The directory path that failed to be created
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Invalid log file path (no filename component)
    #[error("Invalid log file path: {0:?}")]
    InvalidPath(PathBuf),

    /// Tracing subscriber already initialized
    #[error("Tracing subscriber already initialized")]
    SubscriberAlreadySet,
}

/// Where log lines go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Append to a file, creating its directory.
    File(PathBuf),
    /// Write to stderr.
    Stderr,
}

/// Filter from `RUST_LOG`, falling back to `default_directive`.
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Create the log directory and split the path into directory and file name.
///
/// # Errors
///
/// Returns `InvalidPath` if the path has no file name and
/// `DirectoryCreation` if the directory cannot be created.
pub fn prepare_log_file(log_path: &Path) -> Result<(PathBuf, String), LoggingError> {
    let file_name = log_path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| LoggingError::InvalidPath(log_path.to_path_buf()))?;

    let directory = match log_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    std::fs::create_dir_all(&directory).map_err(|source| LoggingError::DirectoryCreation {
        path: directory.clone(),
        source,
    })?;

    Ok((directory, file_name.to_string()))
}

/// Install the global tracing subscriber.
///
/// Respects `RUST_LOG`, defaulting to [`DEFAULT_DIRECTIVE`]. File output has
/// ANSI colors disabled.
///
/// # Errors
///
/// Returns an error if the log directory cannot be prepared or a subscriber
/// is already installed.
pub fn init(target: &LogTarget) -> Result<(), LoggingError> {
    let filter = env_filter(DEFAULT_DIRECTIVE);
    match target {
        LogTarget::File(path) => {
            let (directory, file_name) = prepare_log_file(path)?;
            let appender = tracing_appender::rolling::never(directory, file_name);
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(appender)
                .with_ansi(false)
                .try_init()
                .map_err(|_| LoggingError::SubscriberAlreadySet)
        }
        LogTarget::Stderr => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|_| LoggingError::SubscriberAlreadySet),
    }
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
