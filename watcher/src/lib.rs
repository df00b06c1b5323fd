//! # Wharf Watcher
//!
//! This crate turns filesystem changes into incremental document
//! deployments. It watches a file or directory tree and hands every added
//! or changed file to a [`DocumentSink`] under a mapped URI.
//!
//! ## Features
//!
//! - **Live Deployment**: Changes are uploaded as they happen
//! - **Serialized Uploads**: One upload at a time, in event order
//! - **Hidden-file Filtering**: Dotfiles never reach the server
//! - **Clean Shutdown**: Watches stop on request, not only at process exit
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Deploy Watcher                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  notify ──► ChangeEvent ──► upload worker ──► DocumentSink      │
//! │                 ▲                │                              │
//! │                 │                ▼                              │
//! │           WatchConfig       UriMapper                           │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod sink;
pub mod watch;

pub use config::{UriMapper, WatchConfig, default_uri_mapper};
pub use error::{Result, WatchError};
pub use event::{ChangeEvent, ChangeKind};
pub use sink::DocumentSink;
pub use watch::DeployWatcher;
