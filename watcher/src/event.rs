//! Change events driving incremental deployment.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

/// A relevant filesystem change under the watch root.
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    /// The kind of change.
    pub kind: ChangeKind,

    /// Path to the affected entry.
    pub path: PathBuf,

    /// When the event was observed.
    pub timestamp: DateTime<Utc>,
}

impl ChangeEvent {
    /// Create an event observed now.
    pub fn new(kind: ChangeKind, path: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            path: path.into(),
            timestamp: Utc::now(),
        }
    }
}

/// Kind of change, reduced to what deployment cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// Entry appeared (created, or renamed into the watched tree).
    Added,

    /// Entry content or metadata changed.
    Changed,

    /// Entry disappeared (deleted, or renamed out of the watched tree).
    Removed,
}

impl ChangeKind {
    /// Reduce a notify event kind to a deployment-relevant change.
    ///
    /// Access notifications and catch-all kinds carry no deployable change
    /// and map to `None`. Renames split into the path that left (removed)
    /// and the path that appeared (added).
    pub fn from_notify(kind: notify::EventKind) -> Option<Self> {
        match kind {
            notify::EventKind::Create(_) => Some(Self::Added),
            notify::EventKind::Modify(modify_kind) => match modify_kind {
                notify::event::ModifyKind::Name(rename) => match rename {
                    notify::event::RenameMode::From => Some(Self::Removed),
                    notify::event::RenameMode::To => Some(Self::Added),
                    _ => Some(Self::Changed),
                },
                _ => Some(Self::Changed),
            },
            notify::EventKind::Remove(_) => Some(Self::Removed),
            _ => None,
        }
    }
}
