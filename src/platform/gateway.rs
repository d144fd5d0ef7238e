//! The slice of the Remote Gateway the sync loop and bulk download use.

use async_trait::async_trait;

use super::error::PlatformError;

/// Document mutations and transfers needed by folder workflows.
#[async_trait]
pub trait DocumentGateway: Send + Sync {
    /// Replace a document's content with a local file's bytes.
    async fn replace_content(
        &self,
        cabinet_id: &str,
        document_id: &str,
        bytes: Vec<u8>,
        file_name: &str,
    ) -> Result<(), PlatformError>;

    /// Set one string field on a document.
    async fn update_field(
        &self,
        cabinet_id: &str,
        document_id: &str,
        field: &str,
        value: &str,
    ) -> Result<(), PlatformError>;

    /// Fetch a document's binary content.
    async fn download(&self, cabinet_id: &str, document_id: &str) -> Result<Vec<u8>, PlatformError>;
}
