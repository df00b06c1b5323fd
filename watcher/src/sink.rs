//! The upload port the watcher drives.

use std::path::Path;

use async_trait::async_trait;

/// Upserts one file into a target database.
///
/// The watcher only knows how to hand files to this port; the HTTP side
/// lives elsewhere. Inserting the same URI twice is safe, the server keeps
/// the last write.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Insert or replace the document at `uri` with the content of `file`.
    async fn insert(&self, database: &str, uri: &str, file: &Path) -> anyhow::Result<()>;
}
