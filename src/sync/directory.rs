//! Access to the watched directory.
//!
//! Access is re-validated before every scan; a directory that disappeared or
//! became read-only ends the watch instead of failing every file.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs;

use super::error::SyncError;

/// Subdirectory receiving successfully uploaded files.
pub const PROCESSED_DIR: &str = "Processados";

/// Subdirectory receiving abandoned files.
pub const FAILED_DIR: &str = "Erros";

/// Exclusive handle on a watched directory.
#[derive(Debug)]
pub struct DirectoryCapability {
    root: PathBuf,
}

impl DirectoryCapability {
    /// Open and validate a directory.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, SyncError> {
        let cap = Self { root: root.into() };
        cap.validate().await?;
        Ok(cap)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Confirm the directory still exists and is writable.
    pub async fn validate(&self) -> Result<(), SyncError> {
        let meta = match fs::metadata(&self.root).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(SyncError::DirectoryMissing(self.root.clone()))
            }
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return Err(SyncError::PermissionDenied(self.root.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        if !meta.is_dir() {
            return Err(SyncError::NotADirectory(self.root.clone()));
        }
        if meta.permissions().readonly() {
            return Err(SyncError::PermissionDenied(self.root.clone()));
        }
        Ok(())
    }

    /// Names of regular files directly inside the directory, sorted.
    pub async fn file_names(&self) -> Result<Vec<String>, SyncError> {
        let mut entries = fs::read_dir(&self.root).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => SyncError::DirectoryMissing(self.root.clone()),
            ErrorKind::PermissionDenied => SyncError::PermissionDenied(self.root.clone()),
            _ => e.into(),
        })?;

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let is_file = match entry.file_type().await {
                Ok(t) => t.is_file(),
                Err(e) if e.kind() == ErrorKind::NotFound => false,
                Err(e) => return Err(e.into()),
            };
            if let (true, Ok(name)) = (is_file, entry.file_name().into_string()) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    pub async fn exists(&self, name: &str) -> bool {
        fs::try_exists(self.root.join(name)).await.unwrap_or(false)
    }

    pub async fn read(&self, name: &str) -> std::io::Result<Vec<u8>> {
        fs::read(self.root.join(name)).await
    }

    /// Move a file into a subdirectory by copying it and deleting the original.
    ///
    /// A missing source surfaces as `NotFound`.
    pub async fn move_into(&self, name: &str, subdir: &str) -> std::io::Result<PathBuf> {
        let source = self.root.join(name);
        let dest_dir = self.root.join(subdir);
        fs::create_dir_all(&dest_dir).await?;
        let dest = dest_dir.join(name);
        fs::copy(&source, &dest).await?;
        fs::remove_file(&source).await?;
        Ok(dest)
    }
}
