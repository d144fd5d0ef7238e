//! Column schema derivation and default visibility.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::models::Document;

/// Name of the virtual column backed by a saved view's status extractor.
pub const CUSTOM_STATUS: &str = "customStatus";

/// Number of columns shown when no semantic role matched anything.
const FALLBACK_VISIBLE: usize = 6;

/// Where a column's value comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    /// Top-level document property.
    Standard,
    /// Entry of the document's field collection.
    Field,
}

/// A derived table column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub label: String,
    pub kind: ColumnKind,
}

impl Column {
    pub fn standard(name: &str, label: &str) -> Self {
        Self {
            name: name.to_string(),
            label: label.to_string(),
            kind: ColumnKind::Standard,
        }
    }

    pub fn field(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            kind: ColumnKind::Field,
        }
    }
}

/// Standard columns, always present, in default order.
pub const STANDARD_COLUMNS: [(&str, &str); 6] = [
    ("Id", "Document ID"),
    ("Title", "Title"),
    ("ContentType", "Type"),
    ("FileSize", "Size"),
    ("CreatedAt", "Created At"),
    ("LastModified", "Last Modified"),
];

/// Semantic roles used to rank columns and pick default visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticRole {
    Identifier,
    DocumentType,
    DocumentNumber,
    Status,
    Date,
    Size,
}

/// Role priority table: synonyms matched against lowercased name or label.
pub const RELEVANCE_RULES: &[(SemanticRole, &[&str])] = &[
    (SemanticRole::Identifier, &["id", "dwdocid", "document id"]),
    (SemanticRole::DocumentType, &["tipo de documento", "dwdoctype"]),
    (
        SemanticRole::DocumentNumber,
        &[
            "número do documento",
            "numero do documento",
            "document number",
            "nº do documento",
            "no.",
            "n_de_documento",
            "nº documento",
            "no de documento",
        ],
    ),
    (SemanticRole::Status, &["estatuto", "status", "state"]),
    (
        SemanticRole::Date,
        &["dwstoredatetime", "store date", "data de armazenamento", "created at"],
    ),
    (SemanticRole::Size, &["dwdisksize", "filesize", "size", "tamanho"]),
];

fn matches_synonyms(column: &Column, synonyms: &[&str]) -> bool {
    let name = column.name.to_lowercase();
    let label = column.label.to_lowercase();
    synonyms
        .iter()
        .any(|m| name == *m || label == *m || label.contains(m))
}

/// Index of the first role whose synonyms match, if any.
pub fn relevance_rank(column: &Column) -> Option<usize> {
    RELEVANCE_RULES
        .iter()
        .position(|(_, synonyms)| matches_synonyms(column, synonyms))
}

fn explicit_list(explicit: Option<&[String]>) -> Option<&[String]> {
    explicit.filter(|list| !list.is_empty())
}

/// Derive the column schema of a result set.
///
/// Only the first document is inspected for custom fields. System and memo
/// fields are skipped and names are de-duplicated (first occurrence wins).
/// Without an explicit column list, ranked columns move ahead of unranked
/// ones; the sort is stable so unranked columns keep their relative order.
pub fn derive_columns(documents: &[Document], explicit: Option<&[String]>) -> Vec<Column> {
    let Some(first) = documents.first() else {
        return Vec::new();
    };

    let mut seen = HashSet::new();
    let mut columns: Vec<Column> = STANDARD_COLUMNS
        .iter()
        .map(|(name, label)| Column::standard(name, label))
        .chain(
            first
                .fields
                .iter()
                .filter(|f| !f.system && !f.is_memo())
                .map(|f| Column::field(f.name.clone(), f.display_label())),
        )
        .filter(|c| seen.insert(c.name.clone()))
        .collect();

    if explicit_list(explicit).is_none() {
        columns.sort_by_key(|c| relevance_rank(c).unwrap_or(usize::MAX));
    }

    columns
}

/// Column name -> visible.
pub type Visibility = HashMap<String, bool>;

/// Default visible columns.
///
/// An explicit list shows exactly those columns. Otherwise the first column
/// matching each semantic role is shown; if nothing matched at all, the first
/// six columns are.
pub fn default_visibility(columns: &[Column], explicit: Option<&[String]>) -> Visibility {
    if let Some(list) = explicit_list(explicit) {
        return list.iter().map(|name| (name.clone(), true)).collect();
    }

    let mut visible = Visibility::new();
    for (_, synonyms) in RELEVANCE_RULES {
        if let Some(col) = columns.iter().find(|c| matches_synonyms(c, synonyms)) {
            visible.insert(col.name.clone(), true);
        }
    }

    if visible.is_empty() {
        for col in columns.iter().take(FALLBACK_VISIBLE) {
            visible.insert(col.name.clone(), true);
        }
    }

    visible
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Field, ValueKind};
    use serde_json::json;

    fn sample_docs() -> Vec<Document> {
        vec![
            Document::new(1)
                .with_field(Field::new("AMOUNT", ValueKind::Decimal, json!(10.5)))
                .with_field(Field::new("ESTATUTO", ValueKind::String, json!("Aberto")))
                .with_field(
                    Field::new("DOCTYPE", ValueKind::String, json!("Fatura"))
                        .with_label("Tipo de Documento"),
                )
                .with_field(Field::new("NOTES", ValueKind::Memo, json!("long text")))
                .with_field(Field::new("DWDOCID", ValueKind::Int, json!(1)).system())
                .with_field(Field::new("AMOUNT", ValueKind::Decimal, json!(11))),
            Document::new(2).with_field(Field::new("LATE_FIELD", ValueKind::String, json!("x"))),
        ]
    }

    fn names(columns: &[Column]) -> Vec<&str> {
        columns.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_empty_documents_yield_no_columns() {
        assert!(derive_columns(&[], None).is_empty());
        assert!(default_visibility(&[], None).is_empty());
    }

    #[test]
    fn test_first_document_only_and_exclusions() {
        let cols = derive_columns(&sample_docs(), Some(&["Id".to_string()]));
        assert_eq!(
            names(&cols),
            vec![
                "Id",
                "Title",
                "ContentType",
                "FileSize",
                "CreatedAt",
                "LastModified",
                "AMOUNT",
                "ESTATUTO",
                "DOCTYPE"
            ]
        );
    }

    #[test]
    fn test_relevance_ordering() {
        let cols = derive_columns(&sample_docs(), None);
        assert_eq!(
            names(&cols),
            vec![
                "Id",
                "DOCTYPE",
                "ESTATUTO",
                "CreatedAt",
                "FileSize",
                "Title",
                "ContentType",
                "LastModified",
                "AMOUNT"
            ]
        );
    }

    #[test]
    fn test_derive_columns_is_idempotent() {
        let docs = sample_docs();
        let before = docs.clone();
        let a = derive_columns(&docs, None);
        let b = derive_columns(&docs, None);
        assert_eq!(a, b);
        assert_eq!(docs, before);
    }

    #[test]
    fn test_default_visibility_by_role() {
        let cols = derive_columns(&sample_docs(), None);
        let visible = default_visibility(&cols, None);
        let mut shown: Vec<&str> = visible.keys().map(String::as_str).collect();
        shown.sort();
        assert_eq!(shown, vec!["CreatedAt", "DOCTYPE", "ESTATUTO", "FileSize", "Id"]);
    }

    #[test]
    fn test_default_visibility_explicit_list() {
        let cols = derive_columns(&sample_docs(), None);
        let explicit = vec!["AMOUNT".to_string()];
        let visible = default_visibility(&cols, Some(&explicit));
        assert_eq!(visible.len(), 1);
        assert_eq!(visible.get("AMOUNT"), Some(&true));
    }

    #[test]
    fn test_default_visibility_fallback() {
        let cols: Vec<Column> = (0..8)
            .map(|i| Column::field(format!("F{}", i), format!("Field {}", i)))
            .collect();
        let visible = default_visibility(&cols, None);
        assert_eq!(visible.len(), 6);
        assert!(visible.contains_key("F0"));
        assert!(!visible.contains_key("F6"));
    }
}
