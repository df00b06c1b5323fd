//! Error types for the deploy watcher.

use thiserror::Error;

/// Result type alias for watch operations.
pub type Result<T> = std::result::Result<T, WatchError>;

/// Errors that can occur while setting up a watch.
///
/// Errors raised by the underlying notification mechanism after the watch
/// is running are logged and swallowed, not surfaced here: a transient
/// watch hiccup must not stop a deploy session.
#[derive(Error, Debug)]
pub enum WatchError {
    /// Watch root does not exist.
    #[error("watch path not found: {0}")]
    PathNotFound(String),

    /// This instance is already watching.
    #[error("watch already running for: {0}")]
    AlreadyRunning(String),

    /// Notify error.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
