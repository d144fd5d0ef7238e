//! Table engine: column derivation, cell resolution, filtering, sorting,
//! pagination and CSV export over an in-memory result set.

pub mod columns;
pub mod csv;
pub mod format;
pub mod resolve;
pub mod view;

pub use columns::{default_visibility, derive_columns, Column, ColumnKind, Visibility, CUSTOM_STATUS};
pub use format::{format_date, format_size, DEFAULT_DATE_FORMAT, MISSING};
pub use resolve::{field_value, CellValue, Resolver};
pub use view::{
    apply_filters, apply_sort, paginate, ColumnFilters, Page, SortDirection, SortState,
    StatusExtractor, TableView, DEFAULT_PAGE_SIZE,
};
