//! Folder workflows: bulk download into round-trip filenames and the folder
//! watcher that uploads them back.

pub mod directory;
pub mod download;
mod error;
pub mod naming;
pub mod state;
pub mod watcher;

pub use directory::{DirectoryCapability, FAILED_DIR, PROCESSED_DIR};
pub use download::{bulk_download, DownloadItem, DownloadReport};
pub use error::SyncError;
pub use naming::{download_filename, parse_round_trip_name, RoundTripName};
pub use state::{ErrorKind, FileJob, JobTable};
pub use watcher::{FieldUpdate, FolderWatcher, StopReason, Tally, TickReport, WatchOptions, WatchSummary};
