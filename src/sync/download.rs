//! Sequential bulk download into round-trip filenames.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use super::error::SyncError;
use super::naming::download_filename;
use crate::models::Document;
use crate::platform::DocumentGateway;

/// One document to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadItem {
    pub document_id: String,
    pub cabinet_id: String,
    pub title: String,
}

impl DownloadItem {
    pub fn new(document_id: impl Into<String>, cabinet_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            cabinet_id: cabinet_id.into(),
            title: title.into(),
        }
    }

    /// Title falls back to the document id.
    pub fn from_document(doc: &Document, cabinet_id: &str) -> Self {
        let id = doc.id();
        let title = doc.title().map(str::to_string).unwrap_or_else(|| id.clone());
        Self::new(id, cabinet_id, title)
    }

    pub fn file_name(&self) -> String {
        download_filename(&self.document_id, &self.cabinet_id, &self.title)
    }
}

/// Per-item results of a bulk download.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub saved: Vec<PathBuf>,
    /// Document id and error message.
    pub failed: Vec<(String, String)>,
}

impl DownloadReport {
    pub fn success_count(&self) -> usize {
        self.saved.len()
    }

    pub fn error_count(&self) -> usize {
        self.failed.len()
    }
}

/// Fetch each item in turn and write it under `dest`.
///
/// One request is outstanding at a time. Failures are recorded and the batch
/// continues. `on_item` is called after every item with whether it succeeded.
pub async fn bulk_download<G, F>(
    gateway: &G,
    items: &[DownloadItem],
    dest: &Path,
    mut on_item: F,
) -> Result<DownloadReport, SyncError>
where
    G: DocumentGateway + ?Sized,
    F: FnMut(&DownloadItem, bool),
{
    tokio::fs::create_dir_all(dest).await?;
    let mut report = DownloadReport::default();

    for item in items {
        let path = dest.join(item.file_name());
        let result = match gateway.download(&item.cabinet_id, &item.document_id).await {
            Ok(bytes) => tokio::fs::write(&path, bytes).await.map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(()) => {
                info!("Saved document {} to {}", item.document_id, path.display());
                report.saved.push(path);
                on_item(item, true);
            }
            Err(e) => {
                warn!("Failed to download document {}: {}", item.document_id, e);
                report.failed.push((item.document_id.clone(), e));
                on_item(item, false);
            }
        }
    }

    info!(
        "Bulk download finished: {} saved, {} failed",
        report.success_count(),
        report.error_count()
    );
    Ok(report)
}
