//! Authenticated session, passed explicitly to the platform client.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::store::{write_atomic, StoreError};

/// Bearer token plus the platform it was issued for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// Normalized platform base URL, e.g. `https://acme.docuware.cloud`.
    pub base_url: String,
    pub username: String,
    pub token: String,
    /// Organization id taken from the identity service path.
    #[serde(default)]
    pub organization_id: String,
}

impl Session {
    /// Root of the platform REST API.
    pub fn platform_root(&self) -> String {
        format!("{}/DocuWare/Platform", self.base_url)
    }

    /// Web client URL that opens a document in the viewer.
    pub fn view_url(&self, cabinet_id: &str, document_id: &str) -> String {
        format!(
            "{}/WebClient/{}/Integration?fc={}&did={}&p=V",
            self.platform_root(),
            self.organization_id,
            urlencoding::encode(cabinet_id),
            urlencoding::encode(document_id)
        )
    }
}

/// Persisted session at `<data_dir>/session.json`.
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub const FILE_NAME: &'static str = "session.json";

    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(Self::FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The saved session, if any.
    pub fn load(&self) -> Result<Option<Session>, StoreError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, session: &Session) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(session)?;
        write_atomic(&self.path, content.as_bytes())?;
        debug!("Saved session to {}", self.path.display());
        Ok(())
    }

    /// Remove the saved session. Returns whether one existed.
    pub fn clear(&self) -> Result<bool, StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
