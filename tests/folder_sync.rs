//! Folder watcher state machine against an in-memory gateway.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tempfile::tempdir;
use tokio::sync::Notify;
use tokio::time::Instant;

use docusync::platform::{DocumentGateway, PlatformError};
use docusync::sync::{
    DirectoryCapability, FieldUpdate, FolderWatcher, StopReason, WatchOptions, FAILED_DIR,
    PROCESSED_DIR,
};

#[derive(Default)]
struct FakeGateway {
    uploads: Mutex<Vec<(String, String, Vec<u8>)>>,
    updates: Mutex<Vec<(String, String, String)>>,
    fail_uploads: AtomicBool,
    fail_updates: AtomicBool,
    /// Deleted from disk during the first upload.
    delete_on_upload: Mutex<Option<PathBuf>>,
}

impl FakeGateway {
    fn upload_count(&self) -> usize {
        self.uploads.lock().unwrap().len()
    }
}

#[async_trait]
impl DocumentGateway for FakeGateway {
    async fn replace_content(
        &self,
        cabinet_id: &str,
        document_id: &str,
        bytes: Vec<u8>,
        _file_name: &str,
    ) -> Result<(), PlatformError> {
        self.uploads
            .lock()
            .unwrap()
            .push((cabinet_id.to_string(), document_id.to_string(), bytes));
        if let Some(path) = self.delete_on_upload.lock().unwrap().take() {
            std::fs::remove_file(path).unwrap();
        }
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(PlatformError::Status {
                status: 500,
                message: "upload rejected".into(),
            });
        }
        Ok(())
    }

    async fn update_field(
        &self,
        _cabinet_id: &str,
        document_id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), PlatformError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(PlatformError::Status {
                status: 400,
                message: "field is read-only".into(),
            });
        }
        self.updates.lock().unwrap().push((
            document_id.to_string(),
            field.to_string(),
            value.to_string(),
        ));
        Ok(())
    }

    async fn download(&self, _: &str, _: &str) -> Result<Vec<u8>, PlatformError> {
        Ok(Vec::new())
    }
}

async fn watcher_for<G: DocumentGateway + ?Sized>(
    gateway: Arc<G>,
    dir: &Path,
    options: WatchOptions,
    start: Instant,
) -> FolderWatcher<G> {
    let cap = DirectoryCapability::open(dir).await.unwrap();
    FolderWatcher::starting_at(gateway, cap, options, start)
}

#[tokio::test]
async fn success_moves_file_to_processed() {
    let dir = tempdir().unwrap();
    let name = "123___abc___Invoice__9.pdf";
    std::fs::write(dir.path().join(name), b"new content").unwrap();

    let gateway = Arc::new(FakeGateway::default());
    let options = WatchOptions {
        update: Some(FieldUpdate {
            field: "STATUS".into(),
            value: "Signed".into(),
        }),
        ..Default::default()
    };
    let now = Instant::now();
    let watcher = watcher_for(gateway.clone(), dir.path(), options, now).await;

    let report = watcher.tick_at(now).await.unwrap();
    assert_eq!(report.eligible, 1);
    assert_eq!(report.uploaded, 1);

    let uploads = gateway.uploads.lock().unwrap().clone();
    assert_eq!(uploads, vec![("abc".to_string(), "123".to_string(), b"new content".to_vec())]);
    assert_eq!(
        *gateway.updates.lock().unwrap(),
        vec![("123".to_string(), "STATUS".to_string(), "Signed".to_string())]
    );
    assert!(!dir.path().join(name).exists());
    assert!(dir.path().join(PROCESSED_DIR).join(name).exists());
    assert_eq!(watcher.tally().await.success, 1);
}

#[tokio::test]
async fn metadata_failure_still_moves_file() {
    let dir = tempdir().unwrap();
    let name = "7___cab___Report.pdf";
    std::fs::write(dir.path().join(name), b"x").unwrap();

    let gateway = Arc::new(FakeGateway::default());
    gateway.fail_updates.store(true, Ordering::SeqCst);
    let options = WatchOptions {
        update: Some(FieldUpdate {
            field: "STATUS".into(),
            value: "Signed".into(),
        }),
        ..Default::default()
    };
    let now = Instant::now();
    let watcher = watcher_for(gateway.clone(), dir.path(), options, now).await;

    let report = watcher.tick_at(now).await.unwrap();
    assert_eq!(report.uploaded, 1);
    assert!(dir.path().join(PROCESSED_DIR).join(name).exists());
    let tally = watcher.tally().await;
    assert_eq!(tally.success, 1);
    assert_eq!(tally.errors, 0);
}

#[tokio::test]
async fn repeated_failures_abandon_to_error_folder() {
    let dir = tempdir().unwrap();
    let name = "5___cab___Broken.pdf";
    std::fs::write(dir.path().join(name), b"x").unwrap();

    let gateway = Arc::new(FakeGateway::default());
    gateway.fail_uploads.store(true, Ordering::SeqCst);
    let now = Instant::now();
    let watcher = watcher_for(gateway.clone(), dir.path(), WatchOptions::default(), now).await;

    for attempt in 1..=3 {
        let report = watcher.tick_at(now).await.unwrap();
        assert_eq!(report.failed, 1, "attempt {}", attempt);
        assert!(dir.path().join(name).exists());
    }
    assert_eq!(gateway.upload_count(), 3);

    let report = watcher.tick_at(now).await.unwrap();
    assert_eq!(report.abandoned, 1);
    assert_eq!(gateway.upload_count(), 3, "no fourth upload");
    assert!(!dir.path().join(name).exists());
    assert!(dir.path().join(FAILED_DIR).join(name).exists());

    let tally = watcher.tally().await;
    assert_eq!(tally.errors, 1);
    assert_eq!(tally.success, 0);
}

#[tokio::test]
async fn vanished_file_is_skipped() {
    let dir = tempdir().unwrap();
    let first = "1___cab___A.pdf";
    let second = "2___cab___B.pdf";
    std::fs::write(dir.path().join(first), b"a").unwrap();
    std::fs::write(dir.path().join(second), b"b").unwrap();

    let gateway = Arc::new(FakeGateway::default());
    *gateway.delete_on_upload.lock().unwrap() = Some(dir.path().join(second));
    let now = Instant::now();
    let watcher = watcher_for(gateway.clone(), dir.path(), WatchOptions::default(), now).await;

    let report = watcher.tick_at(now).await.unwrap();
    assert_eq!(report.eligible, 2);
    assert_eq!(report.uploaded, 1);
    assert_eq!(report.skipped, 1);
    assert_eq!(gateway.upload_count(), 1);
    assert_eq!(watcher.tally().await.errors, 0);
}

#[tokio::test]
async fn non_matching_files_untouched() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
    std::fs::write(dir.path().join("1___cab___A.docx"), b"x").unwrap();

    let gateway = Arc::new(FakeGateway::default());
    let now = Instant::now();
    let watcher = watcher_for(gateway.clone(), dir.path(), WatchOptions::default(), now).await;

    let report = watcher.tick_at(now).await.unwrap();
    assert_eq!(report.eligible, 0);
    assert_eq!(gateway.upload_count(), 0);
    assert!(dir.path().join("notes.txt").exists());
    assert!(dir.path().join("1___cab___A.docx").exists());
}

#[tokio::test]
async fn idle_stop_happens_once_after_timeout() {
    let dir = tempdir().unwrap();
    let gateway = Arc::new(FakeGateway::default());
    let start = Instant::now();
    let watcher = watcher_for(gateway, dir.path(), WatchOptions::default(), start).await;

    let report = watcher.tick_at(start + Duration::from_secs(30)).await.unwrap();
    assert_eq!(report.stop, None);
    let report = watcher.tick_at(start + Duration::from_secs(60)).await.unwrap();
    assert_eq!(report.stop, None, "exactly 60s is not yet idle");

    let report = watcher
        .tick_at(start + Duration::from_millis(60_001))
        .await
        .unwrap();
    assert_eq!(report.stop, Some(StopReason::Idle));

    let report = watcher.tick_at(start + Duration::from_secs(120)).await.unwrap();
    assert_eq!(report.stop, None, "stop is reported once");
    assert_eq!(report.eligible, 0);
}

#[tokio::test]
async fn activity_resets_idle_clock() {
    let dir = tempdir().unwrap();
    let gateway = Arc::new(FakeGateway::default());
    let start = Instant::now();
    let watcher = watcher_for(gateway, dir.path(), WatchOptions::default(), start).await;

    std::fs::write(dir.path().join("1___cab___A.pdf"), b"a").unwrap();
    let report = watcher.tick_at(start + Duration::from_secs(50)).await.unwrap();
    assert_eq!(report.uploaded, 1);

    let report = watcher.tick_at(start + Duration::from_secs(100)).await.unwrap();
    assert_eq!(report.stop, None);
    let report = watcher.tick_at(start + Duration::from_secs(111)).await.unwrap();
    assert_eq!(report.stop, Some(StopReason::Idle));
}

#[tokio::test]
async fn removed_directory_stops_watch() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("inbox");
    std::fs::create_dir(&root).unwrap();

    let gateway = Arc::new(FakeGateway::default());
    let now = Instant::now();
    let watcher = watcher_for(gateway, &root, WatchOptions::default(), now).await;

    std::fs::remove_dir(&root).unwrap();
    let report = watcher.tick_at(now).await.unwrap();
    assert_eq!(report.stop, Some(StopReason::AccessLost));
}

/// Blocks every upload until released.
struct BlockingGateway {
    entered: Notify,
    release: Notify,
    uploads: AtomicUsize,
}

#[async_trait]
impl DocumentGateway for BlockingGateway {
    async fn replace_content(&self, _: &str, _: &str, _: Vec<u8>, _: &str) -> Result<(), PlatformError> {
        self.uploads.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.release.notified().await;
        Ok(())
    }

    async fn update_field(&self, _: &str, _: &str, _: &str, _: &str) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn download(&self, _: &str, _: &str) -> Result<Vec<u8>, PlatformError> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn overlapping_tick_is_skipped() {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("1___cab___A.pdf"), b"a").unwrap();

    let gateway = Arc::new(BlockingGateway {
        entered: Notify::new(),
        release: Notify::new(),
        uploads: AtomicUsize::new(0),
    });
    let now = Instant::now();
    let watcher = Arc::new(watcher_for(gateway.clone(), dir.path(), WatchOptions::default(), now).await);

    let running = {
        let watcher = watcher.clone();
        tokio::spawn(async move { watcher.try_tick_at(now).await })
    };

    gateway.entered.notified().await;
    assert!(watcher.try_tick_at(now).await.is_none());

    gateway.release.notify_one();
    let report = running.await.unwrap().unwrap().unwrap();
    assert_eq!(report.uploaded, 1);
    assert_eq!(gateway.uploads.load(Ordering::SeqCst), 1);
}
