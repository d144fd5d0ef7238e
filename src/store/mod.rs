//! Local state: saved views per user, manual statuses per view, and the last
//! selected cabinet, kept in a single JSON file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::models::{ManualStatus, SavedView};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid state file: {0}")]
    Json(#[from] serde_json::Error),
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, bytes)?;
    std::fs::rename(&tmp, path)
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StateFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    last_cabinet: Option<String>,
    /// Username -> saved views.
    #[serde(default)]
    controls: BTreeMap<String, Vec<SavedView>>,
    /// View id -> document id -> status.
    #[serde(default)]
    statuses: BTreeMap<String, BTreeMap<String, ManualStatus>>,
}

/// JSON-backed store at `<data_dir>/state.json`.
pub struct ControlStore {
    path: PathBuf,
}

impl ControlStore {
    pub const FILE_NAME: &'static str = "state.json";

    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(Self::FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StateFile, StoreError> {
        if !self.path.exists() {
            return Ok(StateFile::default());
        }
        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(StateFile::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    fn save(&self, state: &StateFile) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(state)?;
        write_atomic(&self.path, content.as_bytes())?;
        Ok(())
    }

    pub fn last_cabinet(&self) -> Result<Option<String>, StoreError> {
        Ok(self.load()?.last_cabinet)
    }

    pub fn set_last_cabinet(&self, cabinet_id: Option<&str>) -> Result<(), StoreError> {
        let mut state = self.load()?;
        state.last_cabinet = cabinet_id.map(str::to_string);
        self.save(&state)
    }

    pub fn controls(&self, user: &str) -> Result<Vec<SavedView>, StoreError> {
        Ok(self.load()?.controls.remove(user).unwrap_or_default())
    }

    pub fn control(&self, user: &str, id: &str) -> Result<Option<SavedView>, StoreError> {
        Ok(self.controls(user)?.into_iter().find(|c| c.id == id))
    }

    /// Save a view. New views get a millisecond-timestamp id; `created_at` is
    /// stamped once. A view with a known id replaces the stored one in place.
    pub fn save_control(&self, user: &str, mut control: SavedView) -> Result<SavedView, StoreError> {
        let mut state = self.load()?;
        let controls = state.controls.entry(user.to_string()).or_default();

        if control.id.is_empty() {
            let mut id = Utc::now().timestamp_millis();
            while controls.iter().any(|c| c.id == id.to_string()) {
                id += 1;
            }
            control.id = id.to_string();
        }
        if control.created_at.is_none() {
            control.created_at = Some(Utc::now());
        }

        match controls.iter_mut().find(|c| c.id == control.id) {
            Some(existing) => *existing = control.clone(),
            None => controls.push(control.clone()),
        }

        self.save(&state)?;
        debug!("Saved view {} for {}", control.id, user);
        Ok(control)
    }

    /// Remove a view. Returns whether it existed. Its statuses are kept.
    pub fn delete_control(&self, user: &str, id: &str) -> Result<bool, StoreError> {
        let mut state = self.load()?;
        let Some(controls) = state.controls.get_mut(user) else {
            return Ok(false);
        };
        let before = controls.len();
        controls.retain(|c| c.id != id);
        let removed = controls.len() != before;
        if removed {
            self.save(&state)?;
        }
        Ok(removed)
    }

    pub fn statuses(&self, control_id: &str) -> Result<BTreeMap<String, ManualStatus>, StoreError> {
        Ok(self.load()?.statuses.remove(control_id).unwrap_or_default())
    }

    pub fn item_status(&self, control_id: &str, doc_id: &str) -> Result<Option<ManualStatus>, StoreError> {
        Ok(self.statuses(control_id)?.get(doc_id).copied())
    }

    /// Set or clear (`None`) a document's status within a view.
    pub fn set_item_status(
        &self,
        control_id: &str,
        doc_id: &str,
        status: Option<ManualStatus>,
    ) -> Result<BTreeMap<String, ManualStatus>, StoreError> {
        let mut state = self.load()?;
        let statuses = state.statuses.entry(control_id.to_string()).or_default();
        match status {
            Some(status) => {
                statuses.insert(doc_id.to_string(), status);
            }
            None => {
                statuses.remove(doc_id);
            }
        }
        let snapshot = statuses.clone();
        if snapshot.is_empty() {
            state.statuses.remove(control_id);
        }
        self.save(&state)?;
        Ok(snapshot)
    }
}
