//! Error types for document operations.

use thiserror::Error;
use wharf_transport::StatusCode;

/// Result type alias for document operations.
pub type Result<T> = std::result::Result<T, DocumentError>;

/// Errors that can occur while uploading documents.
#[derive(Error, Debug)]
pub enum DocumentError {
    /// The transport failed (network, authentication, protocol).
    #[error(transparent)]
    Transport(#[from] wharf_transport::TransportError),

    /// The server answered with a status the operation does not accept.
    #[error("unexpected status {status} inserting {uri}")]
    UnexpectedStatus { status: StatusCode, uri: String },

    /// Local file could not be read.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
