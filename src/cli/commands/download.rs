//! Bulk download command.

use std::path::Path;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::helpers::{open_client, parse_filters};
use crate::config::Settings;
use crate::sync::{bulk_download, DownloadItem};

/// Download documents into round-trip filenames under `dest`.
///
/// Without `ids`, every document the search returns is downloaded.
pub async fn cmd_download(
    settings: &Settings,
    cabinet: &str,
    dest: &Path,
    ids: &[String],
    filters: &[String],
) -> anyhow::Result<()> {
    let client = open_client(settings)?;
    let filters = parse_filters(filters)?;

    let items: Vec<DownloadItem> = if ids.is_empty() {
        let result = client.search(cabinet, &filters).await?;
        result
            .items
            .iter()
            .map(|doc| DownloadItem::from_document(doc, cabinet))
            .collect()
    } else {
        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            let item = match client.document(cabinet, id).await {
                Ok(doc) => DownloadItem::from_document(&doc, cabinet),
                Err(e) => {
                    tracing::warn!("Could not fetch title of {}: {}", id, e);
                    DownloadItem::new(id.clone(), cabinet, id.clone())
                }
            };
            items.push(item);
        }
        items
    };

    if items.is_empty() {
        println!("{} Nothing to download", style("!").yellow());
        return Ok(());
    }

    println!(
        "{} Downloading {} documents to {}",
        style("→").cyan(),
        items.len(),
        dest.display()
    );

    let progress = ProgressBar::new(items.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {wide_msg}")
            .unwrap()
            .progress_chars("█▓░"),
    );

    let report = bulk_download(&client, &items, dest, |item, ok| {
        if !ok {
            progress.println(format!(
                "  {} Failed: {}",
                style("✗").red(),
                item.document_id
            ));
        }
        progress.set_message(item.title.clone());
        progress.inc(1);
    })
    .await?;
    progress.finish_and_clear();

    println!(
        "  {} {} saved, {} failed",
        style("✓").green(),
        report.success_count(),
        report.error_count()
    );
    for (id, error) in &report.failed {
        println!("    {} {}: {}", style("✗").red(), id, error);
    }
    Ok(())
}
