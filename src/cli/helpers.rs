//! Shared helper functions for CLI commands.

use anyhow::{anyhow, bail};
use console::style;

use crate::config::Settings;
use crate::models::{SearchFilter, StatusColor};
use crate::platform::{PlatformClient, SessionFile};
use crate::table::{ColumnFilters, TableView};

/// Client for the saved session.
pub fn open_client(settings: &Settings) -> anyhow::Result<PlatformClient> {
    let session = SessionFile::new(&settings.data_dir)
        .load()?
        .ok_or_else(|| anyhow!("Not logged in. Run 'docusync login' first."))?;
    Ok(PlatformClient::new(session, settings.transport()))
}

/// Parse repeated `FIELD=VALUE` arguments.
pub fn parse_filters(args: &[String]) -> anyhow::Result<Vec<SearchFilter>> {
    args.iter()
        .map(|arg| {
            SearchFilter::parse(arg).ok_or_else(|| anyhow!("Invalid filter '{}', expected FIELD=VALUE", arg))
        })
        .collect()
}

/// Group repeated `COLUMN=VALUE` arguments into accepted values per column.
pub fn column_filters(args: &[String]) -> anyhow::Result<ColumnFilters> {
    let mut filters = ColumnFilters::new();
    for arg in args {
        let SearchFilter { field_name, value } = SearchFilter::parse(arg)
            .ok_or_else(|| anyhow!("Invalid column filter '{}', expected COLUMN=VALUE", arg))?;
        filters.entry(field_name).or_default().insert(value);
    }
    Ok(filters)
}

/// Split a comma-separated column list.
pub fn parse_columns(arg: &str) -> Vec<String> {
    arg.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Truncate to `max_len` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let cut: String = s.chars().take(max_len - 3).collect();
        format!("{}...", cut)
    }
}

pub fn require_cabinet(cabinet: Option<String>, last: Option<String>) -> anyhow::Result<String> {
    match cabinet.or(last) {
        Some(c) => Ok(c),
        None => bail!("No cabinet given and none used before"),
    }
}

fn paint(text: &str, color: Option<StatusColor>) -> String {
    match color {
        Some(StatusColor::Green) => style(text).green().to_string(),
        Some(StatusColor::Yellow) => style(text).yellow().to_string(),
        Some(StatusColor::Red) => style(text).red().to_string(),
        Some(StatusColor::Blue) => style(text).blue().to_string(),
        Some(StatusColor::Gray) => style(text).dim().to_string(),
        None => text.to_string(),
    }
}

const MAX_CELL_WIDTH: usize = 30;

/// Print the current page of a table view.
///
/// `color_for` paints whole rows, e.g. from status rules.
pub fn print_table<F>(view: &TableView, color_for: F)
where
    F: Fn(&crate::models::Document) -> Option<StatusColor>,
{
    let columns = view.visible_columns();
    let page = view.page();

    let rows: Vec<Vec<String>> = page
        .rows
        .iter()
        .map(|doc| {
            columns
                .iter()
                .map(|c| truncate(&view.cell(doc, c).to_string(), MAX_CELL_WIDTH))
                .collect()
        })
        .collect();

    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            rows.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(truncate(&c.label, MAX_CELL_WIDTH).chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let header: Vec<String> = columns
        .iter()
        .zip(&widths)
        .map(|(c, w)| format!("{:<w$}", truncate(&c.label, MAX_CELL_WIDTH), w = *w))
        .collect();
    let line_width = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);

    println!("{}", style(header.join("  ")).bold());
    println!("{}", "-".repeat(line_width));
    for (doc, row) in page.rows.iter().zip(&rows) {
        let line: Vec<String> = row
            .iter()
            .zip(&widths)
            .map(|(cell, w)| format!("{:<w$}", cell, w = *w))
            .collect();
        println!("{}", paint(&line.join("  "), color_for(*doc)));
    }
    println!("{}", "-".repeat(line_width));
    println!(
        "Page {} of {} ({} rows)",
        page.number,
        page.total_pages.max(1),
        page.total_rows
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 8), "a lon...");
        assert_eq!(truncate("ações", 3), "açõ");
    }

    #[test]
    fn test_parse_filters() {
        let filters = parse_filters(&["STATUS=Open".to_string()]).unwrap();
        assert_eq!(filters[0].field_name, "STATUS");
        assert!(parse_filters(&["nope".to_string()]).is_err());
    }

    #[test]
    fn test_column_filters_group_and_dedupe() {
        let args: Vec<String> = ["STATUS=Open", "STATUS=Open", "STATUS=Closed", "Title=A"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let filters = column_filters(&args).unwrap();
        assert_eq!(filters.len(), 2);
        assert_eq!(
            filters["STATUS"].iter().collect::<Vec<_>>(),
            vec!["Closed", "Open"]
        );
        assert!(column_filters(&["nope".to_string()]).is_err());
    }

    #[test]
    fn test_repeated_where_keeps_filter() {
        use crate::models::{Document, Field, ValueKind};
        use serde_json::json;

        let docs = vec![
            Document::new(1).with_field(Field::new("STATUS", ValueKind::String, json!("Open"))),
            Document::new(2).with_field(Field::new("STATUS", ValueKind::String, json!("Closed"))),
        ];
        let mut view = TableView::new(docs, None);
        let args = vec!["STATUS=Open".to_string(), "STATUS=Open".to_string()];
        for (column, values) in column_filters(&args).unwrap() {
            view.set_filter(&column, values);
        }
        let rows = view.filtered();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id(), "1");
    }

    #[test]
    fn test_parse_columns() {
        assert_eq!(parse_columns("Id, Title,,AMOUNT"), vec!["Id", "Title", "AMOUNT"]);
    }

    #[test]
    fn test_require_cabinet() {
        assert_eq!(require_cabinet(None, Some("c".into())).unwrap(), "c");
        assert_eq!(require_cabinet(Some("a".into()), Some("c".into())).unwrap(), "a");
        assert!(require_cabinet(None, None).is_err());
    }
}
