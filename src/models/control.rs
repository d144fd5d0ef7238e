//! Saved views ("controls") and status-coloring rules.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::document::{Document, SearchFilter};

/// Color tag a status rule paints a row with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusColor {
    Green,
    Yellow,
    Red,
    Blue,
    #[serde(alias = "grey")]
    Gray,
}

impl StatusColor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
            Self::Blue => "blue",
            Self::Gray => "gray",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "green" => Some(Self::Green),
            "yellow" => Some(Self::Yellow),
            "red" => Some(Self::Red),
            "blue" => Some(Self::Blue),
            "gray" | "grey" => Some(Self::Gray),
            _ => None,
        }
    }
}

/// Maps a field value to a color.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusRule {
    #[serde(rename = "value")]
    pub match_value: String,
    #[serde(rename = "color")]
    pub color: StatusColor,
}

impl StatusRule {
    pub fn new(match_value: impl Into<String>, color: StatusColor) -> Self {
        Self {
            match_value: match_value.into(),
            color,
        }
    }

    /// Parse `VALUE=COLOR`.
    pub fn parse(s: &str) -> Option<Self> {
        let (value, color) = s.rsplit_once('=')?;
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Some(Self::new(value, StatusColor::from_str(color)?))
    }
}

/// A field plus the ordered rules applied to its value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusConfig {
    pub field: String,
    pub rules: Vec<StatusRule>,
}

impl StatusConfig {
    /// First rule whose value equals `value` ignoring case wins.
    pub fn color_for_value(&self, value: &str) -> Option<StatusColor> {
        self.rules
            .iter()
            .find(|r| r.match_value.to_lowercase() == value.to_lowercase())
            .map(|r| r.color)
    }

    /// Color for a document, from the configured field's value.
    pub fn color_for(&self, doc: &Document) -> Option<StatusColor> {
        self.color_for_value(&doc.field_text(&self.field))
    }
}

/// Manual tri-state status a user assigns to a document within a view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ManualStatus {
    Approved,
    Pending,
    Rejected,
}

impl ManualStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Pending => "pending",
            Self::Rejected => "rejected",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "approved" => Some(Self::Approved),
            "pending" => Some(Self::Pending),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

/// A persisted, named combination of cabinet, filters, columns and status rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedView {
    /// Empty until first saved.
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub cabinet_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cabinet_name: Option<String>,
    #[serde(default)]
    pub filters: Vec<SearchFilter>,
    #[serde(default)]
    pub visible_columns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_field: Option<String>,
    #[serde(default)]
    pub status_rules: Vec<StatusRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl SavedView {
    pub fn new(name: impl Into<String>, cabinet_id: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            cabinet_id: cabinet_id.into(),
            cabinet_name: None,
            filters: Vec::new(),
            visible_columns: Vec::new(),
            status_field: None,
            status_rules: Vec::new(),
            created_at: None,
        }
    }

    /// Status configuration, when a status field is set.
    pub fn status_config(&self) -> Option<StatusConfig> {
        self.status_field.as_ref().map(|field| StatusConfig {
            field: field.clone(),
            rules: self.status_rules.clone(),
        })
    }

    /// Value shown in the virtual status column.
    ///
    /// Uses the status field when configured, otherwise the manual status
    /// recorded for the document.
    pub fn custom_status_value(&self, doc: &Document, manual: Option<ManualStatus>) -> String {
        match &self.status_field {
            Some(field) => doc.field_text(field),
            None => manual.map(|m| m.as_str().to_string()).unwrap_or_default(),
        }
    }

    /// Reorder columns: the first filter's field, then the status field, then the rest.
    pub fn normalize_column_order(&mut self) {
        let mut ordered: Vec<String> = Vec::with_capacity(self.visible_columns.len() + 2);
        if let Some(primary) = self.filters.first() {
            ordered.push(primary.field_name.clone());
        }
        if let Some(status) = &self.status_field {
            ordered.push(status.clone());
        }
        for col in &self.visible_columns {
            ordered.push(col.clone());
        }
        let mut seen = std::collections::HashSet::new();
        ordered.retain(|c| seen.insert(c.clone()));
        self.visible_columns = ordered;
    }
}
