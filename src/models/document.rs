//! Document models returned by the platform's cabinet and search endpoints.
//!
//! Documents are heterogeneous: apart from `Id` and the `Fields` collection,
//! the set of top-level properties differs between cabinets and platform
//! versions, so they are kept as a raw JSON map and resolved lazily by the
//! table engine.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Kind of value carried by a document field (`ItemElementName`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueKind {
    String,
    Int,
    Decimal,
    Date,
    DateTime,
    Memo,
    Keywords,
    Table,
    #[default]
    #[serde(other)]
    Other,
}

impl ValueKind {
    pub fn is_temporal(&self) -> bool {
        matches!(self, Self::Date | Self::DateTime)
    }
}

/// A named, typed attribute attached to a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "FieldName", default)]
    pub name: String,
    #[serde(rename = "FieldLabel", default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Alternate (database) name some endpoints use instead of `FieldName`.
    #[serde(rename = "DBName", default, skip_serializing_if = "Option::is_none")]
    pub db_name: Option<String>,
    #[serde(rename = "SystemField", default)]
    pub system: bool,
    #[serde(rename = "ItemElementName", default)]
    pub kind: ValueKind,
    #[serde(rename = "Item", default)]
    pub item: Value,
    #[serde(rename = "IsNull", default)]
    pub is_null: bool,
}

impl Field {
    /// Create a plain user field.
    pub fn new(name: impl Into<String>, kind: ValueKind, item: Value) -> Self {
        Self {
            name: name.into(),
            kind,
            item,
            ..Default::default()
        }
    }

    /// Mark this field as platform-owned.
    pub fn system(mut self) -> Self {
        self.system = true;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn with_db_name(mut self, db_name: impl Into<String>) -> Self {
        self.db_name = Some(db_name.into());
        self
    }

    /// Display label, falling back to the field name.
    pub fn display_label(&self) -> &str {
        self.label
            .as_deref()
            .filter(|l| !l.is_empty())
            .unwrap_or(&self.name)
    }

    /// Whether the name or alternate name matches `key`, ignoring case.
    pub fn matches(&self, key: &str) -> bool {
        self.name.eq_ignore_ascii_case(key)
            || self
                .db_name
                .as_deref()
                .is_some_and(|db| db.eq_ignore_ascii_case(key))
    }

    /// Date/time fields are formatted as dates; so is anything named like one.
    pub fn is_date(&self) -> bool {
        self.kind.is_temporal() || self.name.to_lowercase().contains("date")
    }

    pub fn is_memo(&self) -> bool {
        self.kind == ValueKind::Memo
    }
}

/// A link attached to a platform resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub rel: String,
    pub href: String,
}

/// A content section (file) of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Section {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "ContentType", default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(rename = "OriginalFileName", default, skip_serializing_if = "Option::is_none")]
    pub original_file_name: Option<String>,
    #[serde(rename = "Links", default)]
    pub links: Vec<Link>,
}

impl Section {
    /// Find a link by relation name.
    pub fn link(&self, rel: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.rel.eq_ignore_ascii_case(rel))
            .map(|l| l.href.as_str())
    }
}

/// A document as returned by a search.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(rename = "Fields", default)]
    pub fields: Vec<Field>,
    #[serde(rename = "Sections", default, skip_serializing_if = "Vec::is_empty")]
    pub sections: Vec<Section>,
    /// Every other top-level property, as delivered.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Document {
    /// Create a document with only an identifier.
    pub fn new(id: impl Into<Value>) -> Self {
        let mut properties = Map::new();
        properties.insert("Id".to_string(), id.into());
        Self {
            properties,
            ..Default::default()
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Stable document identifier, stringified.
    pub fn id(&self) -> String {
        match self.property("Id") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        }
    }

    /// Document title, if present and non-empty.
    pub fn title(&self) -> Option<&str> {
        self.property("Title")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
    }

    /// Case-insensitive top-level property lookup.
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    /// Case-insensitive field lookup by name or alternate name.
    pub fn field(&self, key: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.matches(key))
    }

    /// Field value as a string, empty when absent.
    pub fn field_text(&self, name: &str) -> String {
        self.field(name)
            .map(|f| value_text(&f.item))
            .unwrap_or_default()
    }
}

/// Stringify a JSON scalar the way the platform displays it.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Array(items) => items.iter().map(value_text).collect::<Vec<_>>().join(", "),
        Value::Object(map) => map
            .get("Item")
            .or_else(|| map.get("Value"))
            .map(value_text)
            .unwrap_or_default(),
    }
}

/// Field definition from a cabinet's schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CabinetField {
    #[serde(rename = "DBFieldName", alias = "DBName", alias = "FieldName", default)]
    pub db_name: String,
    #[serde(rename = "DisplayName", alias = "FieldLabel", default)]
    pub display_name: String,
    #[serde(rename = "DWFieldType", default, skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    #[serde(rename = "SystemField", default)]
    pub system: bool,
    #[serde(rename = "Scope", default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl CabinetField {
    /// Display name, falling back to the database name.
    pub fn label(&self) -> &str {
        if self.display_name.is_empty() {
            &self.db_name
        } else {
            &self.display_name
        }
    }

    /// Searchable by end users: not system-owned and not a memo.
    pub fn is_user_field(&self) -> bool {
        !self.system && self.field_type.as_deref() != Some("Memo")
    }

    /// Broader system test used when building saved views.
    pub fn is_system(&self) -> bool {
        self.system
            || self.scope.as_deref() == Some("System")
            || self.db_name.to_uppercase().starts_with("DW")
    }
}

/// A named remote collection of documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Cabinet {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "Name", default)]
    pub name: String,
    #[serde(rename = "Color", default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(rename = "IsBasket", default)]
    pub is_basket: bool,
}

/// A remote-defined query template bound to a cabinet.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dialog {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "DisplayName", default)]
    pub display_name: String,
    #[serde(rename = "Type", default)]
    pub kind: String,
}

impl Dialog {
    pub fn is_search(&self) -> bool {
        self.kind == "Search"
    }
}

/// One equality condition of a search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilter {
    pub field_name: String,
    pub value: String,
}

impl SearchFilter {
    pub fn new(field_name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            value: value.into(),
        }
    }

    /// Parse `FIELD=VALUE`.
    pub fn parse(s: &str) -> Option<Self> {
        let (field, value) = s.split_once('=')?;
        let field = field.trim();
        let value = value.trim();
        if field.is_empty() || value.is_empty() {
            return None;
        }
        Some(Self::new(field, value))
    }
}

/// Outcome of a search: the returned page plus the platform's total count.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub items: Vec<Document>,
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_document_deserializes_with_extra_properties() {
        let doc: Document = serde_json::from_value(json!({
            "Id": 42,
            "Title": "Contract",
            "FileSize": 2048,
            "Fields": [
                {"FieldName": "STATUS", "FieldLabel": "Status", "Item": "Approved", "ItemElementName": "String"},
                {"FieldName": "DWSTOREDATETIME", "SystemField": true, "Item": "/Date(1700000000000)/", "ItemElementName": "DateTime"}
            ]
        }))
        .unwrap();

        assert_eq!(doc.id(), "42");
        assert_eq!(doc.title(), Some("Contract"));
        assert_eq!(doc.property("filesize"), Some(&json!(2048)));
        assert_eq!(doc.fields.len(), 2);
        assert!(doc.field("dwstoredatetime").unwrap().system);
        assert_eq!(doc.field_text("STATUS"), "Approved");
    }

    #[test]
    fn test_unknown_item_element_name() {
        let field: Field =
            serde_json::from_value(json!({"FieldName": "X", "ItemElementName": "Blob"})).unwrap();
        assert_eq!(field.kind, ValueKind::Other);
    }

    #[test]
    fn test_field_is_date_by_name() {
        let f = Field::new("INVOICE_DATE", ValueKind::String, json!("2024-01-01"));
        assert!(f.is_date());
        let f = Field::new("AMOUNT", ValueKind::Decimal, json!(3.5));
        assert!(!f.is_date());
    }

    #[test]
    fn test_search_filter_parse() {
        assert_eq!(
            SearchFilter::parse("Status = Approved"),
            Some(SearchFilter::new("Status", "Approved"))
        );
        assert_eq!(SearchFilter::parse("Status="), None);
        assert_eq!(SearchFilter::parse("no-equals"), None);
    }

    #[test]
    fn test_cabinet_field_classification() {
        let f: CabinetField = serde_json::from_value(json!({
            "DBFieldName": "NOTES", "DisplayName": "Notes", "DWFieldType": "Memo"
        }))
        .unwrap();
        assert!(!f.is_user_field());

        let f: CabinetField =
            serde_json::from_value(json!({"DBFieldName": "DWDOCID", "DisplayName": ""})).unwrap();
        assert!(f.is_system());
        assert_eq!(f.label(), "DWDOCID");
    }
}
