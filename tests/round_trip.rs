//! Files written by bulk download are picked up by the folder watcher with
//! the same document identity.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::tempdir;
use tokio::time::Instant;

use docusync::platform::{DocumentGateway, PlatformError};
use docusync::sync::{
    bulk_download, parse_round_trip_name, DirectoryCapability, DownloadItem, FolderWatcher,
    WatchOptions, PROCESSED_DIR,
};

/// Remote content keyed by (cabinet, document).
#[derive(Default)]
struct InMemoryPlatform {
    content: Mutex<HashMap<(String, String), Vec<u8>>>,
}

#[async_trait]
impl DocumentGateway for InMemoryPlatform {
    async fn replace_content(
        &self,
        cabinet_id: &str,
        document_id: &str,
        bytes: Vec<u8>,
        _file_name: &str,
    ) -> Result<(), PlatformError> {
        let mut content = self.content.lock().unwrap();
        let key = (cabinet_id.to_string(), document_id.to_string());
        if !content.contains_key(&key) {
            return Err(PlatformError::Status {
                status: 404,
                message: "no such document".into(),
            });
        }
        content.insert(key, bytes);
        Ok(())
    }

    async fn update_field(&self, _: &str, _: &str, _: &str, _: &str) -> Result<(), PlatformError> {
        Ok(())
    }

    async fn download(&self, cabinet_id: &str, document_id: &str) -> Result<Vec<u8>, PlatformError> {
        self.content
            .lock()
            .unwrap()
            .get(&(cabinet_id.to_string(), document_id.to_string()))
            .cloned()
            .ok_or(PlatformError::Status {
                status: 404,
                message: "no such document".into(),
            })
    }
}

#[test]
fn download_name_parses_back() {
    let item = DownloadItem::new("123", "abc", "Invoice #9");
    let name = item.file_name();
    assert_eq!(name, "123___abc___Invoice__9.pdf");

    let parsed = parse_round_trip_name(&name).unwrap();
    assert_eq!(parsed.document_id, "123");
    assert_eq!(parsed.cabinet_id, "abc");
}

#[tokio::test]
async fn downloaded_files_upload_back_to_their_documents() {
    let platform = Arc::new(InMemoryPlatform::default());
    {
        let mut content = platform.content.lock().unwrap();
        content.insert(("cab-1".into(), "10".into()), b"original ten".to_vec());
        content.insert(("cab-1".into(), "11".into()), b"original eleven".to_vec());
    }

    let dir = tempdir().unwrap();
    let items = vec![
        DownloadItem::new("10", "cab-1", "Contrato de prestação"),
        DownloadItem::new("11", "cab-1", "Nota fiscal 2024/03"),
    ];
    let report = bulk_download(platform.as_ref(), &items, dir.path(), |_, _| {})
        .await
        .unwrap();
    assert_eq!(report.success_count(), 2);

    // Edit both files locally.
    for path in &report.saved {
        let mut bytes = std::fs::read(path).unwrap();
        bytes.extend_from_slice(b" (signed)");
        std::fs::write(path, bytes).unwrap();
    }

    let cap = DirectoryCapability::open(dir.path()).await.unwrap();
    let now = Instant::now();
    let watcher = FolderWatcher::starting_at(platform.clone(), cap, WatchOptions::default(), now);
    let tick = watcher.tick_at(now).await.unwrap();
    assert_eq!(tick.uploaded, 2);

    let content = platform.content.lock().unwrap();
    assert_eq!(
        content[&("cab-1".to_string(), "10".to_string())],
        b"original ten (signed)".to_vec()
    );
    assert_eq!(
        content[&("cab-1".to_string(), "11".to_string())],
        b"original eleven (signed)".to_vec()
    );
    for path in &report.saved {
        let name = path.file_name().unwrap();
        assert!(dir.path().join(PROCESSED_DIR).join(name).exists());
    }
}
