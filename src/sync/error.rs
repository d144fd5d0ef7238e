//! Folder workflow errors.

use std::path::PathBuf;

use thiserror::Error;

use crate::platform::PlatformError;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Directory not found: {0}")]
    DirectoryMissing(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Permission denied for {0}")]
    PermissionDenied(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

impl SyncError {
    /// The watched directory can no longer be used.
    pub fn is_access_lost(&self) -> bool {
        matches!(
            self,
            Self::DirectoryMissing(_) | Self::NotADirectory(_) | Self::PermissionDenied(_)
        )
    }
}
