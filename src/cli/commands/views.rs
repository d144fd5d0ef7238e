//! Saved view ("control") management and manual statuses.

use anyhow::{anyhow, bail};
use console::style;

use crate::cli::helpers::{open_client, parse_columns, parse_filters, truncate};
use crate::config::Settings;
use crate::models::{ManualStatus, SavedView, StatusRule};
use crate::platform::SessionFile;
use crate::store::ControlStore;

/// Saved views are kept per user.
fn current_user(settings: &Settings) -> anyhow::Result<String> {
    SessionFile::new(&settings.data_dir)
        .load()?
        .map(|s| s.username)
        .ok_or_else(|| anyhow!("Not logged in. Run 'docusync login' first."))
}

pub async fn cmd_views_list(settings: &Settings) -> anyhow::Result<()> {
    let user = current_user(settings)?;
    let views = ControlStore::new(&settings.data_dir).controls(&user)?;
    if views.is_empty() {
        println!("{} No saved views", style("!").yellow());
        return Ok(());
    }

    println!("{:<15} {:<28} {:<24} Created", "ID", "Name", "Cabinet");
    println!("{}", "-".repeat(80));
    for view in views {
        let created = view
            .created_at
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!(
            "{:<15} {:<28} {:<24} {}",
            view.id,
            truncate(&view.name, 28),
            truncate(view.cabinet_name.as_deref().unwrap_or(&view.cabinet_id), 24),
            created
        );
    }
    Ok(())
}

pub async fn cmd_views_show(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let user = current_user(settings)?;
    let store = ControlStore::new(&settings.data_dir);
    let view = store
        .control(&user, id)?
        .ok_or_else(|| anyhow!("Saved view '{}' not found", id))?;

    println!("{}", style(&view.name).bold());
    println!("  Cabinet:  {}", view.cabinet_name.as_deref().unwrap_or(&view.cabinet_id));
    for filter in &view.filters {
        println!("  Filter:   {} = {}", filter.field_name, filter.value);
    }
    if !view.visible_columns.is_empty() {
        println!("  Columns:  {}", view.visible_columns.join(", "));
    }
    if let Some(field) = &view.status_field {
        println!("  Status:   {}", field);
    }
    for rule in &view.status_rules {
        println!("  Rule:     {} -> {}", rule.match_value, rule.color.as_str());
    }

    let statuses = store.statuses(&view.id)?;
    if !statuses.is_empty() {
        println!("  Marked documents:");
        for (doc, status) in statuses {
            println!("    {:<12} {}", doc, status.as_str());
        }
    }
    Ok(())
}

pub async fn cmd_views_delete(settings: &Settings, id: &str) -> anyhow::Result<()> {
    let user = current_user(settings)?;
    let store = ControlStore::new(&settings.data_dir);
    if store.delete_control(&user, id)? {
        println!("{} Deleted view {}", style("✓").green(), id);
    } else {
        println!("{} View '{}' not found", style("!").yellow(), id);
    }
    Ok(())
}

pub struct SaveArgs {
    pub id: Option<String>,
    pub name: String,
    pub cabinet: String,
    pub filters: Vec<String>,
    pub columns: Option<String>,
    pub status_field: Option<String>,
    pub rules: Vec<String>,
}

/// Create or replace a saved view. The cabinet name is looked up remotely.
pub async fn cmd_views_save(settings: &Settings, args: SaveArgs) -> anyhow::Result<()> {
    let client = open_client(settings)?;
    let user = client.session().username.clone();

    let mut view = SavedView::new(args.name, args.cabinet);
    view.id = args.id.unwrap_or_default();
    view.filters = parse_filters(&args.filters)?;
    view.visible_columns = args.columns.as_deref().map(parse_columns).unwrap_or_default();
    view.status_field = args.status_field;
    view.status_rules = args
        .rules
        .iter()
        .map(|r| StatusRule::parse(r).ok_or_else(|| anyhow!("Invalid rule '{}', expected VALUE=COLOR", r)))
        .collect::<anyhow::Result<_>>()?;
    if !view.status_rules.is_empty() && view.status_field.is_none() {
        bail!("Status rules need --status-field");
    }

    match client.list_cabinets().await {
        Ok(cabinets) => {
            view.cabinet_name = cabinets
                .into_iter()
                .find(|c| c.id == view.cabinet_id)
                .map(|c| c.name);
        }
        Err(e) => tracing::warn!("Could not look up cabinet name: {}", e),
    }
    view.normalize_column_order();

    let saved = ControlStore::new(&settings.data_dir).save_control(&user, view)?;
    println!("{} Saved view {} ({})", style("✓").green(), saved.name, saved.id);
    Ok(())
}

/// Set or clear a document's manual status within a view.
pub async fn cmd_views_mark(settings: &Settings, view: &str, document: &str, status: &str) -> anyhow::Result<()> {
    let status = match status.to_lowercase().as_str() {
        "none" | "clear" => None,
        other => Some(
            ManualStatus::from_str(other)
                .ok_or_else(|| anyhow!("Unknown status '{}' (approved, pending, rejected, none)", other))?,
        ),
    };

    let user = current_user(settings)?;
    let store = ControlStore::new(&settings.data_dir);
    if store.control(&user, view)?.is_none() {
        bail!("Saved view '{}' not found", view);
    }
    store.set_item_status(view, document, status)?;

    match status {
        Some(s) => println!("{} {} marked {}", style("✓").green(), document, s.as_str()),
        None => println!("{} {} cleared", style("✓").green(), document),
    }
    Ok(())
}
