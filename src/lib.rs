//! docusync - document platform client.
//!
//! Searches file cabinets and renders the results through an in-memory table
//! engine, bulk-downloads documents into round-trip filenames, watches a
//! folder to upload edited files back, and runs a local forwarding relay.

#![allow(clippy::should_implement_trait)]

pub mod analytics;
pub mod cli;
pub mod config;
pub mod models;
pub mod platform;
pub mod relay;
pub mod store;
pub mod sync;
pub mod table;
