//! Error types for the transport layer.

use thiserror::Error;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Errors that can occur while talking to a document server.
#[derive(Error, Debug)]
pub enum TransportError {
    /// Network-level failure (connect, timeout, TLS, body transfer).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server replied with something the protocol does not allow.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// The server demanded a quality-of-protection we do not implement.
    #[error("unsupported digest qop: {0}")]
    UnsupportedQop(String),

    /// Re-authentication kept failing with 401.
    #[error("authentication failed after {attempts} attempts: {url}")]
    AuthExhausted { url: String, attempts: u32 },

    /// The server never came back up within the polling budget.
    #[error("server did not restart after {attempts} polls")]
    RestartTimeout { attempts: u32 },

    /// The server answered the restart poll but with an unusable response.
    #[error("restart verification failed: {0}")]
    RestartVerification(String),

    /// Credentials could not be obtained from the provider.
    #[error("credential error: {0}")]
    Credentials(String),

    /// Malformed URL.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
