//! Watch configuration and URI mapping.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Maps (watch root, changed path) onto the target document URI.
pub type UriMapper = Arc<dyn Fn(&Path, &Path) -> String + Send + Sync>;

/// Configuration for one deploy watch.
#[derive(Clone)]
pub struct WatchConfig {
    /// File or directory to watch.
    pub path: PathBuf,

    /// Descend into subdirectories. Ignored when the root is a single file.
    pub recursive: bool,

    /// Target database for uploads.
    pub database: String,

    /// Converts event paths into document URIs.
    pub uri_mapper: UriMapper,
}

impl WatchConfig {
    /// Create a recursive watch over `path`, uploading into `database`.
    pub fn new(path: impl Into<PathBuf>, database: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            recursive: true,
            database: database.into(),
            uri_mapper: default_uri_mapper(),
        }
    }

    /// Set whether subdirectories are watched.
    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    /// Replace the URI mapper.
    pub fn with_uri_mapper(mut self, uri_mapper: UriMapper) -> Self {
        self.uri_mapper = uri_mapper;
        self
    }

    /// Whether an entry is hidden and must not be deployed.
    ///
    /// Checks every path component below the watch root for a leading dot,
    /// so `src/.git/HEAD` and `.env` are both hidden while a dot in a parent
    /// of the root itself does not suppress the whole watch.
    pub fn is_hidden(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.path).unwrap_or(path);
        relative.components().any(|component| {
            matches!(
                component,
                Component::Normal(name) if name.to_string_lossy().starts_with('.')
            )
        })
    }

    /// The document URI for a changed path.
    pub fn uri_for(&self, path: &Path) -> String {
        (self.uri_mapper)(&self.path, path)
    }
}

impl fmt::Debug for WatchConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchConfig")
            .field("path", &self.path)
            .field("recursive", &self.recursive)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

/// The standard mapper: the path relative to the watch root, with forward
/// slashes and a leading `/`.
///
/// A single-file watch maps to `/<file name>`.
pub fn default_uri_mapper() -> UriMapper {
    Arc::new(|base: &Path, path: &Path| {
        let relative = path.strip_prefix(base).unwrap_or(path);
        if relative.as_os_str().is_empty() {
            return match path.file_name() {
                Some(name) => format!("/{}", name.to_string_lossy()),
                None => "/".to_string(),
            };
        }
        let mut uri = String::new();
        for component in relative.components() {
            if let Component::Normal(name) = component {
                uri.push('/');
                uri.push_str(&name.to_string_lossy());
            }
        }
        uri
    })
}
