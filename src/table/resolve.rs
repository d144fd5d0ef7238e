//! Typed cell resolution.
//!
//! Standard columns are resolved through [`STANDARD_LOOKUPS`], a fixed table
//! of candidate property keys consulted in order, with an optional fallback
//! into the document's field collection.

use std::cmp::Ordering;
use std::fmt;

use serde_json::Value;

use super::columns::{Column, ColumnKind};
use super::format::{compare_text, format_date, format_number, format_size, DEFAULT_DATE_FORMAT, MISSING};
use crate::models::{value_text, Document};

/// A resolved cell.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Number(f64),
    Text(String),
}

impl CellValue {
    pub fn missing() -> Self {
        Self::Text(MISSING.to_string())
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(_) => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Text(s) if s == MISSING)
    }

    /// Total order: numbers numerically, then all text in collation order.
    pub fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Number(_), Self::Text(_)) => Ordering::Less,
            (Self::Text(_), Self::Number(_)) => Ordering::Greater,
            (Self::Text(a), Self::Text(b)) => compare_text(a, b),
        }
    }

    fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => n.as_f64().map(Self::Number).unwrap_or_else(Self::missing),
            Value::Null => Self::missing(),
            other => {
                let text = value_text(other);
                if text.is_empty() {
                    Self::missing()
                } else {
                    Self::Text(text)
                }
            }
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// How a standard column renders its raw value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellFormat {
    Raw,
    Size,
    Date,
}

/// Resolution rule for one standard column.
#[derive(Debug, Clone, Copy)]
pub struct StandardLookup {
    pub column: &'static str,
    /// Property keys tried in order, case-insensitively.
    pub keys: &'static [&'static str],
    /// Field consulted when no property yields a value.
    pub field_fallback: Option<&'static str>,
    pub format: CellFormat,
}

pub const STANDARD_LOOKUPS: &[StandardLookup] = &[
    StandardLookup {
        column: "Id",
        keys: &["Id"],
        field_fallback: None,
        format: CellFormat::Raw,
    },
    StandardLookup {
        column: "Title",
        keys: &["Title"],
        field_fallback: None,
        format: CellFormat::Raw,
    },
    StandardLookup {
        column: "ContentType",
        keys: &["ContentType"],
        field_fallback: None,
        format: CellFormat::Raw,
    },
    StandardLookup {
        column: "FileSize",
        keys: &["FileSize"],
        field_fallback: None,
        format: CellFormat::Size,
    },
    StandardLookup {
        column: "CreatedAt",
        keys: &["DWStoreDateTime", "StoreDateTime", "CreatedAt"],
        field_fallback: Some("DWSTOREDATETIME"),
        format: CellFormat::Date,
    },
    StandardLookup {
        column: "LastModified",
        keys: &["DWModDateTime", "ModDateTime", "LastModified"],
        field_fallback: Some("DWMODDATETIME"),
        format: CellFormat::Date,
    },
];

fn lookup_for(column: &str) -> Option<&'static StandardLookup> {
    STANDARD_LOOKUPS.iter().find(|l| l.column == column)
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Resolves display values for document cells.
#[derive(Debug, Clone)]
pub struct Resolver {
    date_format: String,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(DEFAULT_DATE_FORMAT)
    }
}

impl Resolver {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
        }
    }

    /// Resolve a cell. Never fails: unresolvable cells render as `-`.
    pub fn value(&self, doc: &Document, column: &Column) -> CellValue {
        match column.kind {
            ColumnKind::Standard => self.standard_value(doc, &column.name),
            ColumnKind::Field => self.field_value(doc, &column.name),
        }
    }

    fn standard_value(&self, doc: &Document, name: &str) -> CellValue {
        let lookup = lookup_for(name);
        let keys: &[&str] = lookup.map(|l| l.keys).unwrap_or(&[]);

        let mut raw = keys
            .iter()
            .copied()
            .chain(std::iter::once(name))
            .filter_map(|key| doc.property(key))
            .find(|v| !is_blank(v));

        if raw.is_none() {
            if let Some(fallback) = lookup.and_then(|l| l.field_fallback) {
                raw = doc.field(fallback).map(|f| &f.item).filter(|v| !is_blank(v));
            }
        }

        match lookup.map(|l| l.format).unwrap_or(CellFormat::Raw) {
            CellFormat::Size => {
                let bytes = raw.and_then(json_number).unwrap_or(0.0);
                CellValue::Text(format_size(bytes))
            }
            CellFormat::Date => match raw {
                Some(v) => CellValue::Text(format_date(v, &self.date_format)),
                None => CellValue::missing(),
            },
            CellFormat::Raw => raw.map(CellValue::from_json).unwrap_or_else(CellValue::missing),
        }
    }

    fn field_value(&self, doc: &Document, name: &str) -> CellValue {
        match doc.field(name) {
            Some(field) if field.is_date() => {
                CellValue::Text(format_date(&field.item, &self.date_format))
            }
            Some(field) => CellValue::from_json(&field.item),
            None => CellValue::missing(),
        }
    }
}

fn json_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Resolve a cell with the default date format.
pub fn field_value(doc: &Document, column: &Column) -> CellValue {
    Resolver::default().value(doc, column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, ValueKind};
    use serde_json::json;

    #[test]
    fn test_created_at_falls_back_to_field_case_insensitively() {
        let doc = Document::new(7).with_field(
            Field::new("dwStoreDateTime", ValueKind::DateTime, json!("/Date(1700000000000)/"))
                .system(),
        );
        let cell = field_value(&doc, &Column::standard("CreatedAt", "Created At"));
        assert!(!cell.is_missing());
        assert!(cell.to_string().contains("2023"));
    }

    #[test]
    fn test_created_at_prefers_property_synonyms() {
        let doc = Document::new(7)
            .with_property("storedatetime", "2024-05-06T07:08:09Z")
            .with_field(Field::new("DWSTOREDATETIME", ValueKind::DateTime, json!("2001-01-01")));
        let cell = field_value(&doc, &Column::standard("CreatedAt", "Created At"));
        assert!(cell.to_string().contains("2024"));
    }

    #[test]
    fn test_missing_values_render_sentinel() {
        let doc = Document::default();
        for (name, label) in [("Title", "Title"), ("CreatedAt", "Created At")] {
            assert_eq!(field_value(&doc, &Column::standard(name, label)), CellValue::missing());
        }
        assert_eq!(
            field_value(&doc, &Column::field("NOPE", "Nope")),
            CellValue::missing()
        );
    }

    #[test]
    fn test_size_column() {
        let doc = Document::new(1).with_property("FileSize", 1536);
        assert_eq!(
            field_value(&doc, &Column::standard("FileSize", "Size")).to_string(),
            "1.5 KB"
        );
        assert_eq!(
            field_value(&Document::new(1), &Column::standard("FileSize", "Size")).to_string(),
            "0 Bytes"
        );
    }

    #[test]
    fn test_field_values_keep_numbers() {
        let doc = Document::new(1)
            .with_field(Field::new("AMOUNT", ValueKind::Decimal, json!(12.5)))
            .with_field(Field::new("NAME", ValueKind::String, json!("")))
            .with_field(
                Field::new("X", ValueKind::String, json!("alt")).with_db_name("ALTERNATE"),
            );
        assert_eq!(
            field_value(&doc, &Column::field("amount", "Amount")),
            CellValue::Number(12.5)
        );
        assert!(field_value(&doc, &Column::field("NAME", "Name")).is_missing());
        assert_eq!(
            field_value(&doc, &Column::field("alternate", "Alt")),
            CellValue::Text("alt".to_string())
        );
    }

    #[test]
    fn test_date_named_field_is_formatted() {
        let doc = Document::new(1).with_field(Field::new(
            "DUE_DATE",
            ValueKind::String,
            json!("garbage"),
        ));
        assert!(field_value(&doc, &Column::field("DUE_DATE", "Due")).is_missing());
    }

    #[test]
    fn test_compare_numbers_and_text() {
        assert_eq!(
            CellValue::Number(2.0).compare(&CellValue::Number(10.0)),
            Ordering::Less
        );
        assert_eq!(
            CellValue::Text("2".into()).compare(&CellValue::Text("10".into())),
            Ordering::Greater
        );
    }

    #[test]
    fn test_compare_mixed_is_transitive() {
        let nine = CellValue::Number(9.0);
        let ten = CellValue::Number(10.0);
        let five = CellValue::Text("5".into());
        assert_eq!(nine.compare(&ten), Ordering::Less);
        assert_eq!(ten.compare(&five), Ordering::Less);
        assert_eq!(nine.compare(&five), Ordering::Less);
        assert_eq!(five.compare(&nine), Ordering::Greater);
        assert_eq!(CellValue::missing().compare(&ten), Ordering::Greater);
    }
}
