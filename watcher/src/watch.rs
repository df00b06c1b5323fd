//! The deploy watch itself.
//!
//! Bridges filesystem notifications onto a tokio channel and drains them one
//! at a time into a [`DocumentSink`]. Uploads are strictly serialized: a
//! second change to a file that is still uploading queues behind it, so the
//! server always ends up with the most recent content for a URI.

use std::sync::Arc;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::config::WatchConfig;
use crate::error::{Result, WatchError};
use crate::event::{ChangeEvent, ChangeKind};
use crate::sink::DocumentSink;

/// Queue depth between the notify callback and the upload worker.
const EVENT_QUEUE_DEPTH: usize = 1024;

/// Watches a file or directory tree and deploys every change.
pub struct DeployWatcher {
    config: WatchConfig,
    sink: Arc<dyn DocumentSink>,
    watcher: Option<RecommendedWatcher>,
    shutdown: Option<oneshot::Sender<()>>,
    worker: Option<JoinHandle<()>>,
}

impl DeployWatcher {
    /// Create a watcher that feeds `sink`.
    pub fn new(config: WatchConfig, sink: Arc<dyn DocumentSink>) -> Self {
        Self {
            config,
            sink,
            watcher: None,
            shutdown: None,
            worker: None,
        }
    }

    /// Start watching.
    ///
    /// Registers the filesystem watch and spawns the upload worker; only
    /// changes arriving after this call are deployed, existing content is
    /// the business of a full deploy. Returns once the watch is live.
    pub async fn start(&mut self) -> Result<()> {
        if self.watcher.is_some() {
            return Err(WatchError::AlreadyRunning(
                self.config.path.display().to_string(),
            ));
        }
        if !self.config.path.exists() {
            return Err(WatchError::PathNotFound(
                self.config.path.display().to_string(),
            ));
        }

        let (event_tx, event_rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let config = self.config.clone();
        let mut watcher = notify::recommended_watcher(
            move |res: std::result::Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    let Some(kind) = ChangeKind::from_notify(event.kind) else {
                        return;
                    };
                    for path in event.paths {
                        if config.is_hidden(&path) {
                            continue;
                        }
                        if let Err(e) = event_tx.blocking_send(ChangeEvent::new(kind, &path)) {
                            error!("Failed to queue change event: {e}");
                        }
                    }
                }
                Err(e) => {
                    // A watch hiccup must not end the deploy session.
                    error!("Watch error: {e}");
                }
            },
        )?;

        let mode = if self.config.recursive && self.config.path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(&self.config.path, mode)?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let worker = tokio::spawn(process_events(
            self.config.clone(),
            self.sink.clone(),
            event_rx,
            shutdown_rx,
        ));

        self.watcher = Some(watcher);
        self.shutdown = Some(shutdown_tx);
        self.worker = Some(worker);
        info!(
            "Watching for changes, target is {}: {}",
            self.config.database,
            self.config.path.display()
        );
        Ok(())
    }

    /// Stop watching and wait for the worker to wind down.
    ///
    /// An upload already in progress runs to completion; queued events that
    /// have not started processing are discarded. Safe to call when the
    /// watch was never started.
    pub async fn stop(&mut self) {
        self.watcher = None;
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.await;
        }
        info!("Deploy watch stopped");
    }

    /// Whether the watch is currently live.
    pub fn is_running(&self) -> bool {
        self.watcher.is_some()
    }
}

/// Drains change events until shutdown or channel close.
///
/// Events are handled strictly one at a time, each upload completing before
/// the next event is taken. A dropped shutdown handle counts as a stop
/// signal so an abandoned watch cannot leak its worker.
async fn process_events(
    config: WatchConfig,
    sink: Arc<dyn DocumentSink>,
    mut events: mpsc::Receiver<ChangeEvent>,
    mut shutdown: oneshot::Receiver<()>,
) {
    loop {
        let event = tokio::select! {
            // A requested stop wins over any still-queued events.
            biased;

            _ = &mut shutdown => break,
            event = events.recv() => match event {
                Some(event) => event,
                None => break,
            },
        };
        handle_event(&config, sink.as_ref(), event).await;
    }
    debug!("Event worker finished");
}

/// Applies one change event to the sink.
async fn handle_event(config: &WatchConfig, sink: &dyn DocumentSink, event: ChangeEvent) {
    match event.kind {
        ChangeKind::Added | ChangeKind::Changed => {
            // Directory events and paths gone by the time we get here.
            if !event.path.is_file() {
                return;
            }
            let uri = config.uri_for(&event.path);
            debug!("Uploading {} as {uri}", event.path.display());
            if let Err(e) = sink.insert(&config.database, &uri, &event.path).await {
                error!("Failed to upload {}: {e:#}", event.path.display());
            }
        }
        ChangeKind::Removed => {
            // TODO: issue a document delete for the mapped URI; removals are
            // currently only reported.
            info!(
                "File {} removed, document {} left in place",
                event.path.display(),
                config.uri_for(&event.path)
            );
        }
    }
}
