//! # Wharf Documents
//!
//! Document upload operations for wharf deployments: single-file inserts
//! and batched `multipart/mixed` uploads, both riding on the
//! digest-authenticated transport. The [`DocumentStore`] doubles as the
//! upload sink behind a deploy watch.

pub mod error;
pub mod store;

pub use error::{DocumentError, Result};
pub use store::{DocumentStore, DocumentUpload};
