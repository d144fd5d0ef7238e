//! Content-replacement protocol.
//!
//! Documents whose first section exposes a `content` link are overwritten in
//! place. Otherwise the new file is appended as a section and the original
//! section is deleted afterwards if it is still present. Between the append
//! and the delete the document transiently carries both sections.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::error::PlatformError;
use crate::models::Document;

/// Relation name of a section's direct-overwrite link.
pub const CONTENT_REL: &str = "content";

/// Section-level operations the protocol is built from.
#[async_trait]
pub trait SectionOps: Send + Sync {
    async fn fetch_document(&self, cabinet_id: &str, document_id: &str) -> Result<Document, PlatformError>;

    /// Overwrite content at a section's `content` link.
    async fn put_content(&self, href: &str, bytes: Vec<u8>, file_name: &str) -> Result<(), PlatformError>;

    /// Append `bytes` as a new section of the document.
    async fn append_section(
        &self,
        cabinet_id: &str,
        document_id: &str,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<(), PlatformError>;

    async fn delete_section(&self, cabinet_id: &str, section_id: &str) -> Result<(), PlatformError>;
}

/// How a replacement was carried out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplaceOutcome {
    /// Overwritten through the section's content link.
    Overwritten,
    /// Appended as a new section; `removed` names the original section if it
    /// had to be deleted.
    Appended { removed: Option<String> },
}

/// Replace a document's content with `bytes`.
pub async fn replace_content<S: SectionOps + ?Sized>(
    ops: &S,
    cabinet_id: &str,
    document_id: &str,
    bytes: Vec<u8>,
    file_name: &str,
) -> Result<ReplaceOutcome, PlatformError> {
    let doc = ops.fetch_document(cabinet_id, document_id).await?;
    let original = doc.sections.first();

    if let Some(href) = original.and_then(|s| s.link(CONTENT_REL)) {
        debug!("Overwriting document {} via content link", document_id);
        ops.put_content(href, bytes, file_name).await?;
        return Ok(ReplaceOutcome::Overwritten);
    }

    let original_id = original.map(|s| s.id.clone());
    info!(
        "Document {} has no content link, appending a new section",
        document_id
    );
    ops.append_section(cabinet_id, document_id, bytes, file_name)
        .await?;

    let Some(original_id) = original_id else {
        return Ok(ReplaceOutcome::Appended { removed: None });
    };

    let refreshed = ops.fetch_document(cabinet_id, document_id).await?;
    if !refreshed.sections.iter().any(|s| s.id == original_id) {
        return Ok(ReplaceOutcome::Appended { removed: None });
    }

    match ops.delete_section(cabinet_id, &original_id).await {
        Ok(()) => {}
        Err(e) if e.is_not_found() => {
            warn!("Section {} already removed", original_id);
        }
        Err(e) => return Err(e),
    }
    Ok(ReplaceOutcome::Appended {
        removed: Some(original_id),
    })
}
