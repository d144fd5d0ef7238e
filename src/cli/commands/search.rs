//! Search command: runs a search and renders it through the table engine.

use std::path::PathBuf;

use anyhow::{anyhow, bail};
use console::style;

use crate::cli::helpers::{column_filters, open_client, parse_columns, parse_filters, print_table, require_cabinet};
use crate::config::Settings;
use crate::models::Document;
use crate::store::ControlStore;
use crate::table::{Resolver, SortDirection, TableView};

pub struct SearchArgs {
    pub cabinet: Option<String>,
    pub filters: Vec<String>,
    pub wheres: Vec<String>,
    pub sort: Option<String>,
    pub desc: bool,
    pub page: usize,
    pub page_size: Option<usize>,
    pub columns: Option<String>,
    pub csv: Option<PathBuf>,
    pub view: Option<String>,
    pub format: String,
}

pub async fn cmd_search(settings: &Settings, args: SearchArgs) -> anyhow::Result<()> {
    let client = open_client(settings)?;
    let store = ControlStore::new(&settings.data_dir);
    let user = client.session().username.clone();

    let saved = match &args.view {
        Some(id) => Some(
            store
                .control(&user, id)?
                .ok_or_else(|| anyhow!("Saved view '{}' not found", id))?,
        ),
        None => None,
    };

    let cabinet = require_cabinet(
        args.cabinet.or_else(|| saved.as_ref().map(|v| v.cabinet_id.clone())),
        store.last_cabinet()?,
    )?;

    let mut filters = saved.as_ref().map(|v| v.filters.clone()).unwrap_or_default();
    filters.extend(parse_filters(&args.filters)?);

    let result = client.search(&cabinet, &filters).await?;
    store.set_last_cabinet(Some(&cabinet))?;

    let explicit: Option<Vec<String>> = match (&args.columns, &saved) {
        (Some(cols), _) => Some(parse_columns(cols)),
        (None, Some(v)) if !v.visible_columns.is_empty() => Some(v.visible_columns.clone()),
        _ => None,
    };

    let total = result.total;
    let mut view = TableView::new(result.items, explicit.as_deref())
        .with_resolver(Resolver::new(settings.date_format.clone()))
        .with_page_size(args.page_size.unwrap_or(settings.page_size));

    let status_config = saved.as_ref().and_then(|v| v.status_config());
    if let Some(saved) = saved.clone() {
        let statuses = store.statuses(&saved.id)?;
        let label = saved
            .status_field
            .clone()
            .unwrap_or_else(|| "Status".to_string());
        view = view.with_status_column(
            &label,
            Box::new(move |doc: &Document| saved.custom_status_value(doc, statuses.get(&doc.id()).copied())),
        );
    }

    for (column, values) in column_filters(&args.wheres)? {
        view.set_filter(&column, values);
    }

    if let Some(column) = &args.sort {
        if !view.columns().iter().any(|c| &c.name == column) {
            bail!("Unknown sort column '{}'", column);
        }
        let direction = if args.desc {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        view.set_sort(column, direction);
    }
    view.set_page(args.page);

    if let Some(path) = &args.csv {
        tokio::fs::write(path, view.export_csv()).await?;
        println!(
            "{} Wrote {} rows to {}",
            style("✓").green(),
            view.filtered().len(),
            path.display()
        );
    }

    if view.is_empty() {
        println!("{} No documents found", style("!").yellow());
        return Ok(());
    }

    match args.format.as_str() {
        "json" => {
            let columns = view.visible_columns();
            let rows: Vec<serde_json::Value> = view
                .page()
                .rows
                .iter()
                .map(|doc| {
                    let row: serde_json::Map<String, serde_json::Value> = columns
                        .iter()
                        .map(|c| (c.name.clone(), view.cell(doc, c).to_string().into()))
                        .collect();
                    serde_json::Value::Object(row)
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        "ids" => {
            for doc in view.page().rows {
                println!("{}", doc.id());
            }
        }
        _ => {
            println!(
                "\n{} {} of {} documents in {}\n",
                style("Found").bold(),
                view.documents().len(),
                total,
                cabinet
            );
            print_table(&view, |doc| status_config.as_ref().and_then(|s| s.color_for(doc)));
        }
    }

    Ok(())
}
