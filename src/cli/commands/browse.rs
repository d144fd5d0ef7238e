//! Cabinet, field and dialog listings.

use console::style;

use crate::cli::helpers::{open_client, truncate};
use crate::config::Settings;

/// List file cabinets, sorted by name.
pub async fn cmd_cabinets(settings: &Settings) -> anyhow::Result<()> {
    let client = open_client(settings)?;
    let mut cabinets = client.list_cabinets().await?;
    if cabinets.is_empty() {
        println!("{} No file cabinets available", style("!").yellow());
        return Ok(());
    }
    cabinets.sort_by_key(|c| c.name.to_lowercase());

    println!("\n{}", style("File Cabinets").bold());
    println!("{}", "-".repeat(70));
    println!("{:<38} {:<24} Basket", "ID", "Name");
    println!("{}", "-".repeat(70));
    for cabinet in cabinets {
        println!(
            "{:<38} {:<24} {}",
            cabinet.id,
            truncate(&cabinet.name, 24),
            if cabinet.is_basket { "yes" } else { "" }
        );
    }
    Ok(())
}

/// List a cabinet's fields. System and memo fields are hidden unless `all`.
pub async fn cmd_fields(settings: &Settings, cabinet: &str, all: bool) -> anyhow::Result<()> {
    let client = open_client(settings)?;
    let fields = client.cabinet_fields(cabinet).await?;

    println!("{:<28} {:<30} Type", "DB Name", "Label");
    println!("{}", "-".repeat(70));
    for field in fields.iter().filter(|f| all || f.is_user_field()) {
        println!(
            "{:<28} {:<30} {}",
            field.db_name,
            truncate(field.label(), 30),
            field.field_type.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub async fn cmd_dialogs(settings: &Settings, cabinet: &str) -> anyhow::Result<()> {
    let client = open_client(settings)?;
    for dialog in client.dialogs(cabinet).await? {
        let marker = if dialog.is_search() {
            style("*").green().to_string()
        } else {
            " ".to_string()
        };
        println!("{} {:<38} {:<12} {}", marker, dialog.id, dialog.kind, dialog.display_name);
    }
    Ok(())
}

pub async fn cmd_count(settings: &Settings, cabinet: &str) -> anyhow::Result<()> {
    let client = open_client(settings)?;
    let total = client.document_count(cabinet).await?;
    println!("{}", total);
    Ok(())
}

/// Distinct values of a field.
pub async fn cmd_select_list(settings: &Settings, cabinet: &str, field: &str) -> anyhow::Result<()> {
    let client = open_client(settings)?;
    let values = client.select_list(cabinet, field).await?;
    if values.is_empty() {
        println!("{} No values for {}", style("!").yellow(), field);
    }
    for value in values {
        println!("{}", value);
    }
    Ok(())
}
