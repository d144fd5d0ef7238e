//! Data models for docusync.

mod control;
mod document;

pub use control::{ManualStatus, SavedView, StatusColor, StatusConfig, StatusRule};
pub use document::{
    value_text, Cabinet, CabinetField, Dialog, Document, Field, Link, SearchFilter, SearchResult,
    Section, ValueKind,
};
