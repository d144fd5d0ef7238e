//! Field value distribution across a whole cabinet.

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::analytics::{distribution, fetch_all};
use crate::cli::helpers::{open_client, truncate};
use crate::config::Settings;

const BAR_WIDTH: usize = 30;

pub async fn cmd_stats(settings: &Settings, cabinet: &str, field: &str, batch: usize) -> anyhow::Result<()> {
    let client = open_client(settings)?;

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message("Counting documents...");
    let total = client.document_count(cabinet).await? as usize;

    spinner.set_message(format!("Fetching {} documents...", total));
    let documents = fetch_all(&client, cabinet, total, batch).await?;
    spinner.finish_and_clear();

    let buckets = distribution(&documents, field);
    if buckets.is_empty() {
        println!("{} No documents in {}", style("!").yellow(), cabinet);
        return Ok(());
    }

    println!(
        "\n{} {} across {} documents\n",
        style("Distribution of").bold(),
        style(field).cyan(),
        documents.len()
    );
    for bucket in buckets {
        let filled = ((bucket.percent / 100.0) * BAR_WIDTH as f64).round() as usize;
        println!(
            "{:<30} {:>7} {:>6.1}% {}",
            truncate(&bucket.label, 30),
            bucket.count,
            bucket.percent,
            style("█".repeat(filled)).cyan()
        );
    }
    Ok(())
}
