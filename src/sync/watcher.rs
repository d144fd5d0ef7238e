//! Folder watcher: uploads round-trip files dropped into a directory as
//! content replacements, then files them under `Processados` or `Erros`.

use std::io::ErrorKind as IoErrorKind;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::directory::{DirectoryCapability, FAILED_DIR, PROCESSED_DIR};
use super::error::SyncError;
use super::naming::{parse_round_trip_name, RoundTripName};
use super::state::{Disposition, ErrorKind, JobTable, DEFAULT_MAX_ATTEMPTS};
use crate::platform::DocumentGateway;

/// Field set on a document after its content was replaced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldUpdate {
    pub field: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct WatchOptions {
    pub interval: Duration,
    pub idle_timeout: Duration,
    pub max_attempts: u32,
    pub update: Option<FieldUpdate>,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            update: None,
        }
    }
}

/// Running success/error counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub success: usize,
    pub errors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// No eligible file was seen for the idle timeout.
    Idle,
    /// Stopped by the caller.
    Cancelled,
    /// The directory disappeared or became unwritable.
    AccessLost,
}

/// What one tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Eligible files seen, including abandoned and skipped ones.
    pub eligible: usize,
    pub uploaded: usize,
    pub failed: usize,
    pub abandoned: usize,
    pub skipped: usize,
    pub stop: Option<StopReason>,
}

/// Final outcome of a watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WatchSummary {
    pub tally: Tally,
    pub reason: StopReason,
}

struct WatchState {
    jobs: JobTable,
    tally: Tally,
    last_activity: Instant,
    stopped: Option<StopReason>,
}

enum FileOutcome {
    Uploaded,
    Failed,
    Abandoned,
    Skipped,
}

/// Polls a directory and replaces remote content from matching files.
///
/// Ticks never overlap: the scan state sits behind a mutex and a tick that
/// finds it held is skipped.
pub struct FolderWatcher<G: DocumentGateway + ?Sized> {
    gateway: Arc<G>,
    directory: DirectoryCapability,
    options: WatchOptions,
    state: Mutex<WatchState>,
}

impl<G: DocumentGateway + ?Sized> FolderWatcher<G> {
    pub fn new(gateway: Arc<G>, directory: DirectoryCapability, options: WatchOptions) -> Self {
        Self::starting_at(gateway, directory, options, Instant::now())
    }

    /// Create a watcher whose idle clock starts at `start`.
    pub fn starting_at(
        gateway: Arc<G>,
        directory: DirectoryCapability,
        options: WatchOptions,
        start: Instant,
    ) -> Self {
        let jobs = JobTable::new(options.max_attempts);
        Self {
            gateway,
            directory,
            options,
            state: Mutex::new(WatchState {
                jobs,
                tally: Tally::default(),
                last_activity: start,
                stopped: None,
            }),
        }
    }

    pub fn directory(&self) -> &DirectoryCapability {
        &self.directory
    }

    pub fn options(&self) -> &WatchOptions {
        &self.options
    }

    /// Current tallies; waits for an in-flight tick.
    pub async fn tally(&self) -> Tally {
        self.state.lock().await.tally
    }

    /// Run a tick unless one is already in flight, in which case `None`.
    pub async fn try_tick_at(&self, now: Instant) -> Option<Result<TickReport, SyncError>> {
        let Ok(mut state) = self.state.try_lock() else {
            debug!("Previous scan still running, skipping tick");
            return None;
        };
        Some(self.scan(&mut state, now).await)
    }

    /// Run a tick, waiting for any in-flight one to finish first.
    pub async fn tick_at(&self, now: Instant) -> Result<TickReport, SyncError> {
        let mut state = self.state.lock().await;
        self.scan(&mut state, now).await
    }

    async fn scan(&self, state: &mut WatchState, now: Instant) -> Result<TickReport, SyncError> {
        let mut report = TickReport::default();
        if state.stopped.is_some() {
            return Ok(report);
        }

        if let Err(e) = self.directory.validate().await {
            if e.is_access_lost() {
                warn!("Lost access to {}: {}", self.directory.root().display(), e);
                state.stopped = Some(StopReason::AccessLost);
                report.stop = Some(StopReason::AccessLost);
                return Ok(report);
            }
            return Err(e);
        }

        for name in self.directory.file_names().await? {
            let Some(parsed) = parse_round_trip_name(&name) else {
                continue;
            };
            report.eligible += 1;

            match self.process(state, &name, &parsed).await {
                FileOutcome::Uploaded => report.uploaded += 1,
                FileOutcome::Failed => report.failed += 1,
                FileOutcome::Abandoned => report.abandoned += 1,
                FileOutcome::Skipped => report.skipped += 1,
            }
        }

        if report.eligible > 0 {
            state.last_activity = now;
        } else if now.saturating_duration_since(state.last_activity) > self.options.idle_timeout {
            info!(
                "No files found for {}s, stopping",
                self.options.idle_timeout.as_secs()
            );
            state.stopped = Some(StopReason::Idle);
            report.stop = Some(StopReason::Idle);
        }

        Ok(report)
    }

    async fn process(&self, state: &mut WatchState, name: &str, parsed: &RoundTripName) -> FileOutcome {
        if state.jobs.disposition(name) == Disposition::Abandon {
            warn!(
                "{} failed {} times, moving to {}",
                name,
                state.jobs.max_attempts(),
                FAILED_DIR
            );
            return match self.directory.move_into(name, FAILED_DIR).await {
                Ok(_) => {
                    state.tally.errors += 1;
                    state.jobs.record_abandoned(name);
                    FileOutcome::Abandoned
                }
                Err(e) if e.kind() == IoErrorKind::NotFound => {
                    debug!("{} already gone", name);
                    state.jobs.record_abandoned(name);
                    FileOutcome::Skipped
                }
                Err(e) => {
                    warn!("Failed to move {} to {}: {}", name, FAILED_DIR, e);
                    FileOutcome::Failed
                }
            };
        }

        info!(
            "Detected replacement for document {} in cabinet {}: {}",
            parsed.document_id, parsed.cabinet_id, name
        );

        if !self.directory.exists(name).await {
            debug!("{} vanished before processing", name);
            return FileOutcome::Skipped;
        }
        let bytes = match self.directory.read(name).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!("{} vanished before processing", name);
                return FileOutcome::Skipped;
            }
            Err(e) => return self.fail(state, name, ErrorKind::Read, &e),
        };

        if let Err(e) = self
            .gateway
            .replace_content(&parsed.cabinet_id, &parsed.document_id, bytes, name)
            .await
        {
            return self.fail(state, name, ErrorKind::Upload, &e);
        }
        info!("Uploaded replacement for document {}", parsed.document_id);

        if let Some(update) = &self.options.update {
            match self
                .gateway
                .update_field(
                    &parsed.cabinet_id,
                    &parsed.document_id,
                    &update.field,
                    &update.value,
                )
                .await
            {
                Ok(()) => debug!("Set {} = {:?} on {}", update.field, update.value, parsed.document_id),
                Err(e) => warn!(
                    "Metadata update failed for {} (upload succeeded): {}",
                    parsed.document_id, e
                ),
            }
        }

        match self.directory.move_into(name, PROCESSED_DIR).await {
            Ok(_) => debug!("Moved {} to {}", name, PROCESSED_DIR),
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                debug!("{} already gone", name);
            }
            Err(e) => return self.fail(state, name, ErrorKind::Relocate, &e),
        }
        state.tally.success += 1;
        state.jobs.record_success(name);
        FileOutcome::Uploaded
    }

    fn fail(
        &self,
        state: &mut WatchState,
        name: &str,
        kind: ErrorKind,
        error: &dyn std::fmt::Display,
    ) -> FileOutcome {
        let attempts = state.jobs.record_failure(name, kind);
        warn!(
            "Error processing {}: {} (attempt {}/{})",
            name,
            error,
            attempts,
            state.jobs.max_attempts()
        );
        FileOutcome::Failed
    }

    /// Tick every interval until idle, cancelled, or access is lost.
    ///
    /// Cancellation is observed between ticks; an in-flight tick finishes.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) -> WatchSummary {
        let period = self.options.interval.max(Duration::from_millis(10));
        let mut interval = tokio::time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            "Watching {} every {}s",
            self.directory.root().display(),
            period.as_secs()
        );

        let reason = loop {
            if *cancel.borrow() {
                break StopReason::Cancelled;
            }
            tokio::select! {
                _ = interval.tick() => {}
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        break StopReason::Cancelled;
                    }
                    continue;
                }
            }

            match self.try_tick_at(Instant::now()).await {
                None => {}
                Some(Ok(report)) => {
                    if let Some(reason) = report.stop {
                        break reason;
                    }
                }
                Some(Err(e)) => warn!("Scan failed: {}", e),
            }
        };

        let tally = {
            let mut state = self.state.lock().await;
            if state.stopped.is_none() {
                state.stopped = Some(reason);
            }
            state.tally
        };
        info!(
            "Watch finished ({:?}): {} succeeded, {} failed",
            reason, tally.success, tally.errors
        );
        WatchSummary { tally, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::PlatformError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::tempdir;

    #[derive(Default)]
    struct CountingGateway {
        uploads: AtomicUsize,
    }

    #[async_trait]
    impl DocumentGateway for CountingGateway {
        async fn replace_content(&self, _: &str, _: &str, _: Vec<u8>, _: &str) -> Result<(), PlatformError> {
            self.uploads.fetch_add(1, Ordering::SeqCst);
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
    async fn test_ignores_non_matching_files() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("readme.txt"), b"x").unwrap();
        std::fs::write(dir.path().join("abc___c___t.pdf"), b"x").unwrap();

        let gateway = Arc::new(CountingGateway::default());
        let cap = DirectoryCapability::open(dir.path()).await.unwrap();
        let watcher = FolderWatcher::new(gateway.clone(), cap, WatchOptions::default());

        let report = watcher.tick_at(Instant::now()).await.unwrap();
        assert_eq!(report.eligible, 0);
        assert_eq!(gateway.uploads.load(Ordering::SeqCst), 0);
        assert!(dir.path().join("readme.txt").exists());
        assert!(dir.path().join("abc___c___t.pdf").exists());
    }

    #[tokio::test]
    async fn test_cancelled_run_reports_tally() {
        let dir = tempdir().unwrap();
        let cap = DirectoryCapability::open(dir.path()).await.unwrap();
        let watcher = FolderWatcher::new(
            Arc::new(CountingGateway::default()),
            cap,
            WatchOptions::default(),
        );
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let summary = watcher.run(rx).await;
        assert_eq!(summary.reason, StopReason::Cancelled);
        assert_eq!(summary.tally, Tally::default());
    }
}
