//! End-to-end tests driving a live watch with real filesystem events.
//!
//! Filesystem notification latency varies by platform, so assertions poll
//! with a generous deadline instead of expecting immediate delivery.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::TempDir;

use wharf_watcher::{DeployWatcher, DocumentSink, WatchConfig, WatchError};

struct RecordingSink {
    inserts: Mutex<Vec<(String, String, PathBuf)>>,
}

impl RecordingSink {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            inserts: Mutex::new(Vec::new()),
        })
    }

    fn uris(&self) -> Vec<String> {
        self.inserts
            .lock()
            .unwrap()
            .iter()
            .map(|(_, uri, _)| uri.clone())
            .collect()
    }
}

#[async_trait]
impl DocumentSink for RecordingSink {
    async fn insert(&self, database: &str, uri: &str, file: &Path) -> anyhow::Result<()> {
        self.inserts.lock().unwrap().push((
            database.to_string(),
            uri.to_string(),
            file.to_path_buf(),
        ));
        Ok(())
    }
}

fn fixture() -> (TempDir, PathBuf) {
    let temp = TempDir::new().unwrap();
    let root = temp.path().canonicalize().unwrap();
    (temp, root)
}

/// Poll until `predicate` holds, failing after ten seconds.
async fn wait_until(what: &str, predicate: impl Fn() -> bool) {
    for _ in 0..200 {
        if predicate() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("timed out waiting for: {what}");
}

/// Give the platform watcher a moment to become effective.
async fn settle() {
    tokio::time::sleep(Duration::from_millis(250)).await;
}

#[tokio::test]
async fn test_created_file_is_uploaded_under_its_mapped_uri() {
    let (_temp, root) = fixture();
    let sink = RecordingSink::new();
    let mut watcher = DeployWatcher::new(WatchConfig::new(&root, "content-db"), sink.clone());

    watcher.start().await.unwrap();
    settle().await;
    std::fs::write(root.join("visible.xml"), "<doc/>").unwrap();

    wait_until("upload of /visible.xml", || {
        sink.uris().contains(&"/visible.xml".to_string())
    })
    .await;
    watcher.stop().await;
}

#[tokio::test]
async fn test_nested_files_map_to_nested_uris() {
    let (_temp, root) = fixture();
    std::fs::create_dir(root.join("sub")).unwrap();
    let sink = RecordingSink::new();
    let mut watcher = DeployWatcher::new(WatchConfig::new(&root, "content-db"), sink.clone());

    watcher.start().await.unwrap();
    settle().await;
    std::fs::write(root.join("sub/inner.xml"), "<doc/>").unwrap();

    wait_until("upload of /sub/inner.xml", || {
        sink.uris().contains(&"/sub/inner.xml".to_string())
    })
    .await;
    watcher.stop().await;
}

#[tokio::test]
async fn test_watching_a_single_file_deploys_its_changes() {
    let (_temp, root) = fixture();
    let file = root.join("doc.xml");
    std::fs::write(&file, "<doc/>").unwrap();
    let sink = RecordingSink::new();
    let mut watcher = DeployWatcher::new(WatchConfig::new(&file, "content-db"), sink.clone());

    watcher.start().await.unwrap();
    settle().await;
    std::fs::write(&file, "<doc>updated</doc>").unwrap();

    wait_until("upload of /doc.xml", || {
        sink.uris().contains(&"/doc.xml".to_string())
    })
    .await;
    watcher.stop().await;
}

#[tokio::test]
async fn test_non_recursive_watch_ignores_nested_directories() {
    let (_temp, root) = fixture();
    std::fs::create_dir(root.join("sub")).unwrap();
    let sink = RecordingSink::new();
    let config = WatchConfig::new(&root, "content-db").with_recursive(false);
    let mut watcher = DeployWatcher::new(config, sink.clone());

    watcher.start().await.unwrap();
    settle().await;
    std::fs::write(root.join("sub/inner.xml"), "<doc/>").unwrap();
    std::fs::write(root.join("top.xml"), "<doc/>").unwrap();

    wait_until("upload of /top.xml", || {
        sink.uris().contains(&"/top.xml".to_string())
    })
    .await;
    watcher.stop().await;

    assert!(
        sink.uris().iter().all(|uri| !uri.starts_with("/sub/")),
        "nested entry was uploaded: {:?}",
        sink.uris()
    );
}

#[tokio::test]
async fn test_hidden_files_never_reach_the_sink() {
    let (_temp, root) = fixture();
    let sink = RecordingSink::new();
    let mut watcher = DeployWatcher::new(WatchConfig::new(&root, "content-db"), sink.clone());

    watcher.start().await.unwrap();
    settle().await;
    std::fs::write(root.join(".secret.xml"), "shh").unwrap();
    std::fs::write(root.join("visible.xml"), "<doc/>").unwrap();

    wait_until("upload of /visible.xml", || {
        sink.uris().contains(&"/visible.xml".to_string())
    })
    .await;
    watcher.stop().await;

    assert!(
        sink.uris().iter().all(|uri| !uri.starts_with("/.")),
        "hidden entry was uploaded: {:?}",
        sink.uris()
    );
}

#[tokio::test]
async fn test_start_twice_is_rejected() {
    let (_temp, root) = fixture();
    let sink = RecordingSink::new();
    let mut watcher = DeployWatcher::new(WatchConfig::new(&root, "content-db"), sink);

    watcher.start().await.unwrap();
    let err = watcher.start().await.unwrap_err();
    assert!(matches!(err, WatchError::AlreadyRunning(_)), "got: {err}");
    watcher.stop().await;
}

#[tokio::test]
async fn test_start_on_a_missing_path_is_rejected() {
    let sink = RecordingSink::new();
    let mut watcher = DeployWatcher::new(
        WatchConfig::new("/no/such/path/anywhere", "content-db"),
        sink,
    );

    let err = watcher.start().await.unwrap_err();
    assert!(matches!(err, WatchError::PathNotFound(_)), "got: {err}");
}

#[tokio::test]
async fn test_stop_actually_stops_and_is_idempotent() {
    let (_temp, root) = fixture();
    let sink = RecordingSink::new();
    let mut watcher = DeployWatcher::new(WatchConfig::new(&root, "content-db"), sink.clone());

    watcher.start().await.unwrap();
    assert!(watcher.is_running());
    watcher.stop().await;
    assert!(!watcher.is_running());
    watcher.stop().await;

    // Changes after stop must not be deployed.
    std::fs::write(root.join("late.xml"), "<doc/>").unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(sink.uris().is_empty(), "got: {:?}", sink.uris());
}

#[tokio::test]
async fn test_watch_can_be_restarted_after_stop() {
    let (_temp, root) = fixture();
    let sink = RecordingSink::new();
    let mut watcher = DeployWatcher::new(WatchConfig::new(&root, "content-db"), sink.clone());

    watcher.start().await.unwrap();
    watcher.stop().await;
    watcher.start().await.unwrap();
    settle().await;
    std::fs::write(root.join("after-restart.xml"), "<doc/>").unwrap();

    wait_until("upload of /after-restart.xml", || {
        sink.uris().contains(&"/after-restart.xml".to_string())
    })
    .await;
    watcher.stop().await;
}
