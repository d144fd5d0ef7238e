//! Folder watch command.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use console::style;
use tokio::sync::watch;

use crate::cli::helpers::open_client;
use crate::config::Settings;
use crate::sync::{DirectoryCapability, FieldUpdate, FolderWatcher, StopReason, FAILED_DIR, PROCESSED_DIR};

/// Watch `dir` until idle, Ctrl+C, or loss of access.
pub async fn cmd_watch(
    settings: &Settings,
    dir: &Path,
    update: Option<(String, String)>,
    interval: Option<u64>,
    idle: Option<u64>,
) -> anyhow::Result<()> {
    let client = Arc::new(open_client(settings)?);
    let directory = DirectoryCapability::open(dir).await?;

    let mut options = settings.watch.clone();
    if let Some(secs) = interval.filter(|s| *s > 0) {
        options.interval = Duration::from_secs(secs);
    }
    if let Some(secs) = idle {
        options.idle_timeout = Duration::from_secs(secs);
    }
    if let Some((field, value)) = update {
        options.update = Some(FieldUpdate { field, value });
    }

    println!(
        "{} Watching {} (every {}s, stops after {}s idle)",
        style("→").cyan(),
        directory.root().display(),
        options.interval.as_secs(),
        options.idle_timeout.as_secs()
    );
    if let Some(update) = &options.update {
        println!("  Sets {} = {} after each upload", update.field, update.value);
    }
    println!("  Press Ctrl+C to stop");

    let watcher = FolderWatcher::new(client, directory, options);
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = cancel_tx.send(true);
        }
    });

    let summary = watcher.run(cancel_rx).await;
    let reason = match summary.reason {
        StopReason::Idle => "no new files",
        StopReason::Cancelled => "stopped",
        StopReason::AccessLost => "folder access lost",
    };

    println!(
        "\n{} Watch ended ({}): {} uploaded to {}, {} moved to {}",
        if summary.reason == StopReason::AccessLost {
            style("✗").red()
        } else {
            style("✓").green()
        },
        reason,
        style(summary.tally.success).green(),
        PROCESSED_DIR,
        style(summary.tally.errors).red(),
        FAILED_DIR
    );
    Ok(())
}
