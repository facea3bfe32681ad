//! Error types for the transcript layout engine.
//!
//! This module defines the error taxonomy using `thiserror`. Errors compose via
//! `?` and `From` conversions up to [`AppError`], which only the binary and the
//! headless runner ever surface.
//!
//! # Error Hierarchy
//!
//! - [`AppError`] - Top-level error for the headless runner and CLI
//!   - [`ConfigError`](crate::config::ConfigError) - config file read/parse failures
//!   - [`LoggingError`](crate::logging::LoggingError) - tracing initialization failures
//!   - [`HistoryError`] - history page requests that failed or could not be decoded
//!   - `std::io::Error` - output failures
//! - [`StoreError`] - programmer errors against the reactive store
//! - [`CaretError`] - caret lookups against geometry that is not shaped yet
//!
//! # Recovery Strategy
//!
//! Nothing in the core is fatal. History failures are logged and retried on the
//! next pagination tick, caret lookups that are not ready keep the previous caret
//! point, and degenerate layout metrics skip a frame. Only configuration and
//! logging setup can abort the binary.

use thiserror::Error;

/// Top-level error for the headless runner and CLI.
///
/// # Examples
///
/// ```
/// use transcript_layout::model::error::{AppError, HistoryError};
///
/// fn load() -> Result<(), AppError> {
///     let failure: Result<(), HistoryError> =
///         Err(HistoryError::Unavailable("backend offline".to_string()));
///     failure?;
///     Ok(())
/// }
/// assert!(load().unwrap_err().to_string().contains("backend offline"));
/// ```
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration file could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Tracing subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// History source failed in a way that prevents startup (e.g. unreadable file).
    #[error("History error: {0}")]
    History(#[from] HistoryError),

    /// Writing the layout report failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Layout report could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors raised by the reactive store.
///
/// These are programmer errors: the caller asked to remove something it never
/// registered, or already removed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No subscription with this id is registered under this key.
    ///
    /// One-shot subscriptions that already fired are gone, so unsubscribing them
    /// afterwards also lands here.
    #[error("No subscription {id} found for key '{key}'")]
    NotFound {
        /// Key the caller tried to unsubscribe from.
        key: String,
        /// Raw subscription id.
        id: u64,
    },
}

/// Errors raised when resolving caret geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CaretError {
    /// The caret table is absent because shaping has not completed.
    ///
    /// **Recovery**: keep the previously resolved caret point; do not snap to
    /// the origin.
    #[error("Caret geometry not ready: shaping still pending")]
    NotReady,
}

/// Errors from history page requests.
///
/// All variants are recoverable at the conversation level: the failure is
/// logged and the same page is requested again on the next tick.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    /// The history backend could not be reached or rejected the request.
    #[error("History backend unavailable: {0}")]
    Unavailable(String),

    /// A page was received but could not be decoded.
    #[error("Invalid history page at line {line}: {message}")]
    InvalidPage {
        /// 1-based source line of the page (file-backed sources), 0 otherwise.
        line: usize,
        /// Decoder message.
        message: String,
    },

    /// The request was dropped before a response arrived.
    #[error("History request {id} was dropped before completing")]
    Dropped {
        /// Page id that was requested.
        id: u64,
    },
}

/// Trust score outside `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("Trust must be within [0, 1] (got {0})")]
pub struct InvalidTrust(pub f32);
