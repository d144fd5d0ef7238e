//! Filtered, sorted, paginated view over a result set.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::columns::{default_visibility, derive_columns, Column, ColumnKind, Visibility, CUSTOM_STATUS};
use super::csv;
use super::resolve::{CellValue, Resolver};
use crate::models::Document;

/// Rows per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Column name -> accepted stringified values. An absent column is unfiltered.
pub type ColumnFilters = BTreeMap<String, BTreeSet<String>>;

/// Extracts the virtual status column's value from a document.
pub type StatusExtractor = Box<dyn Fn(&Document) -> String + Send + Sync>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// At most one active sort key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortState {
    pub column: Option<String>,
    pub direction: SortDirection,
}

impl SortState {
    /// A new column starts ascending; the same column flips direction.
    pub fn toggle(&mut self, column: &str) {
        if self.column.as_deref() == Some(column) {
            self.direction = self.direction.flipped();
        } else {
            self.column = Some(column.to_string());
            self.direction = SortDirection::Asc;
        }
    }
}

/// Resolves cells by column name, including the virtual status column.
pub struct CellSource<'a> {
    pub columns: &'a [Column],
    pub resolver: &'a Resolver,
    pub status: Option<&'a StatusExtractor>,
}

impl CellSource<'_> {
    /// `None` when the column is unknown.
    pub fn cell(&self, doc: &Document, column: &str) -> Option<CellValue> {
        if column == CUSTOM_STATUS {
            if let Some(extract) = self.status {
                return Some(CellValue::Text(extract(doc)));
            }
        }
        self.columns
            .iter()
            .find(|c| c.name == column)
            .map(|c| self.resolver.value(doc, c))
    }
}

/// Keep documents whose resolved value is accepted by every active filter.
///
/// Filters naming an unknown column, or holding no values, accept everything.
pub fn apply_filters<'d>(
    documents: &'d [Document],
    filters: &ColumnFilters,
    cells: &CellSource<'_>,
) -> Vec<&'d Document> {
    documents
        .iter()
        .filter(|doc| {
            filters.iter().all(|(column, accepted)| {
                if accepted.is_empty() {
                    return true;
                }
                match cells.cell(doc, column) {
                    Some(value) => accepted.contains(&value.to_string()),
                    None => true,
                }
            })
        })
        .collect()
}

/// Stable sort by the active column. Unknown columns leave the order unchanged.
pub fn apply_sort(rows: &mut [&Document], sort: &SortState, cells: &CellSource<'_>) {
    let Some(column) = sort.column.as_deref() else {
        return;
    };
    rows.sort_by(|a, b| {
        let (Some(av), Some(bv)) = (cells.cell(a, column), cells.cell(b, column)) else {
            return std::cmp::Ordering::Equal;
        };
        let ord = av.compare(&bv);
        match sort.direction {
            SortDirection::Asc => ord,
            SortDirection::Desc => ord.reverse(),
        }
    });
}

/// One-based page window. Pages past the end are empty.
pub fn paginate<T>(rows: &[T], page: usize, page_size: usize) -> &[T] {
    let page_size = page_size.max(1);
    let start = page.saturating_sub(1).saturating_mul(page_size);
    if start >= rows.len() {
        return &[];
    }
    let end = (start + page_size).min(rows.len());
    &rows[start..end]
}

/// A page of rows plus paging metadata.
#[derive(Debug)]
pub struct Page<'a> {
    pub rows: Vec<&'a Document>,
    pub number: usize,
    pub page_size: usize,
    pub total_rows: usize,
    pub total_pages: usize,
}

/// Interactive table state over one result set.
pub struct TableView {
    documents: Vec<Document>,
    columns: Vec<Column>,
    visibility: Visibility,
    filters: ColumnFilters,
    sort: SortState,
    page: usize,
    page_size: usize,
    resolver: Resolver,
    status: Option<StatusExtractor>,
}

impl TableView {
    /// Build a view, deriving columns and default visibility.
    pub fn new(documents: Vec<Document>, explicit_columns: Option<&[String]>) -> Self {
        let columns = derive_columns(&documents, explicit_columns);
        let visibility = default_visibility(&columns, explicit_columns);
        Self {
            documents,
            columns,
            visibility,
            filters: ColumnFilters::new(),
            sort: SortState::default(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            resolver: Resolver::default(),
            status: None,
        }
    }

    pub fn with_resolver(mut self, resolver: Resolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Add the virtual status column, shown first.
    pub fn with_status_column(mut self, label: &str, extractor: StatusExtractor) -> Self {
        if !self.documents.is_empty() && !self.columns.iter().any(|c| c.name == CUSTOM_STATUS) {
            self.columns.insert(
                0,
                Column {
                    name: CUSTOM_STATUS.to_string(),
                    label: label.to_string(),
                    kind: ColumnKind::Standard,
                },
            );
            self.visibility.insert(CUSTOM_STATUS.to_string(), true);
        }
        self.status = Some(extractor);
        self
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// All columns in current order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn is_visible(&self, column: &str) -> bool {
        self.visibility.get(column).copied().unwrap_or(false)
    }

    /// Visible columns, in current order.
    pub fn visible_columns(&self) -> Vec<&Column> {
        self.columns
            .iter()
            .filter(|c| self.is_visible(&c.name))
            .collect()
    }

    fn cells(&self) -> CellSource<'_> {
        CellSource {
            columns: &self.columns,
            resolver: &self.resolver,
            status: self.status.as_ref(),
        }
    }

    /// Resolved value of one cell; `-` for unknown columns.
    pub fn cell(&self, doc: &Document, column: &Column) -> CellValue {
        self.cells()
            .cell(doc, &column.name)
            .unwrap_or_else(CellValue::missing)
    }

    /// Filtered and sorted rows (not paginated).
    pub fn filtered(&self) -> Vec<&Document> {
        let cells = self.cells();
        let mut rows = apply_filters(&self.documents, &self.filters, &cells);
        apply_sort(&mut rows, &self.sort, &cells);
        rows
    }

    /// Current page.
    pub fn page(&self) -> Page<'_> {
        let rows = self.filtered();
        let total_rows = rows.len();
        let total_pages = total_rows.div_ceil(self.page_size);
        Page {
            rows: paginate(&rows, self.page, self.page_size).to_vec(),
            number: self.page,
            page_size: self.page_size,
            total_rows,
            total_pages,
        }
    }

    pub fn page_number(&self) -> usize {
        self.page
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    /// Sort by `column`: new columns start ascending, repeats flip direction.
    pub fn sort_by(&mut self, column: &str) {
        self.sort.toggle(column);
        self.page = 1;
    }

    /// Sort by `column` in an explicit direction.
    pub fn set_sort(&mut self, column: &str, direction: SortDirection) {
        self.sort = SortState {
            column: Some(column.to_string()),
            direction,
        };
        self.page = 1;
    }

    pub fn filters(&self) -> &ColumnFilters {
        &self.filters
    }

    /// Add or remove one accepted value; an emptied filter is dropped.
    pub fn toggle_filter_value(&mut self, column: &str, value: &str) {
        let values = self.filters.entry(column.to_string()).or_default();
        if !values.remove(value) {
            values.insert(value.to_string());
        }
        if values.is_empty() {
            self.filters.remove(column);
        }
        self.page = 1;
    }

    /// Replace a column's accepted values; an empty set clears the filter.
    pub fn set_filter(&mut self, column: &str, values: impl IntoIterator<Item = String>) {
        let values: BTreeSet<String> = values.into_iter().collect();
        if values.is_empty() {
            self.filters.remove(column);
        } else {
            self.filters.insert(column.to_string(), values);
        }
        self.page = 1;
    }

    /// Accept every value the column currently takes.
    pub fn select_all_values(&mut self, column: &str) {
        if !self.columns.iter().any(|c| c.name == column) {
            return;
        }
        let values = self.unique_values(column);
        self.set_filter(column, values);
    }

    pub fn clear_column_filter(&mut self, column: &str) {
        self.filters.remove(column);
        self.page = 1;
    }

    pub fn clear_all_filters(&mut self) {
        self.filters.clear();
        self.page = 1;
    }

    /// Distinct stringified values of a column over the unfiltered set, sorted.
    pub fn unique_values(&self, column: &str) -> Vec<String> {
        let cells = self.cells();
        let values: BTreeSet<String> = self
            .documents
            .iter()
            .filter_map(|doc| cells.cell(doc, column))
            .map(|v| v.to_string())
            .collect();
        values.into_iter().collect()
    }

    pub fn toggle_column(&mut self, column: &str) {
        let visible = self.is_visible(column);
        self.visibility.insert(column.to_string(), !visible);
    }

    pub fn toggle_all_columns(&mut self, show: bool) {
        self.visibility = self
            .columns
            .iter()
            .map(|c| (c.name.clone(), show))
            .collect();
    }

    /// Show exactly the named columns.
    pub fn show_only(&mut self, names: &[String]) {
        self.visibility = names.iter().map(|n| (n.clone(), true)).collect();
    }

    /// Move the visible column at `source` to visible position `target`.
    ///
    /// Indices refer to the visible list; the move is applied to the full
    /// column order. Moving right inserts after the target, moving left
    /// inserts before it. Returns false when nothing moved.
    pub fn reorder_column(&mut self, source: usize, target: usize) -> bool {
        if source == target {
            return false;
        }
        let visible: Vec<String> = self
            .visible_columns()
            .into_iter()
            .map(|c| c.name.clone())
            .collect();
        let (Some(source_name), Some(target_name)) = (visible.get(source), visible.get(target))
        else {
            return false;
        };
        let Some(source_real) = self.columns.iter().position(|c| &c.name == source_name) else {
            return false;
        };

        let moved = self.columns.remove(source_real);
        let Some(mut target_real) = self.columns.iter().position(|c| &c.name == target_name)
        else {
            self.columns.insert(source_real, moved);
            return false;
        };
        if source < target {
            target_real += 1;
        }
        self.columns.insert(target_real, moved);
        true
    }

    /// CSV of every filtered row over the visible columns.
    pub fn export_csv(&self) -> String {
        let columns = self.visible_columns();
        let rows = self.filtered();
        csv::export_csv(&columns, rows, |doc, col| self.cell(doc, col))
    }
}
