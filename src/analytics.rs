//! Value distributions over a cabinet's documents.

use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use tracing::debug;

use crate::models::{value_text, Document, SearchResult};
use crate::platform::{PlatformClient, PlatformError};

/// Label for documents without a value.
pub const EMPTY_LABEL: &str = "(empty)";

/// Requests in flight while fetching a whole cabinet.
pub const FETCH_CONCURRENCY: usize = 4;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

/// Count documents per value of `field`, most frequent first.
///
/// The field is looked up among the document's fields, then its top-level
/// properties. Ties keep label order.
pub fn distribution(documents: &[Document], field: &str) -> Vec<Bucket> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for doc in documents {
        let mut value = doc.field_text(field);
        if value.is_empty() && doc.field(field).is_none() {
            value = doc.property(field).map(value_text).unwrap_or_default();
        }
        let label = if value.trim().is_empty() {
            EMPTY_LABEL.to_string()
        } else {
            value
        };
        *counts.entry(label).or_default() += 1;
    }

    let total = documents.len();
    let mut buckets: Vec<Bucket> = counts
        .into_iter()
        .map(|(label, count)| Bucket {
            label,
            count,
            percent: count as f64 * 100.0 / total as f64,
        })
        .collect();
    buckets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
    buckets
}

/// A paged document listing.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn page(&self, cabinet_id: &str, start: usize, count: usize) -> Result<SearchResult, PlatformError>;
}

#[async_trait]
impl PageSource for PlatformClient {
    async fn page(&self, cabinet_id: &str, start: usize, count: usize) -> Result<SearchResult, PlatformError> {
        self.list_documents(cabinet_id, start, count).await
    }
}

/// Fetch `total` documents in pages of `batch`, a few pages at a time.
///
/// Documents come back in listing order.
pub async fn fetch_all<S: PageSource + ?Sized>(
    source: &S,
    cabinet_id: &str,
    total: usize,
    batch: usize,
) -> Result<Vec<Document>, PlatformError> {
    let batch = batch.max(1);
    let starts: Vec<usize> = (0..total).step_by(batch).collect();
    debug!("Fetching {} documents in {} pages", total, starts.len());

    let mut pages: Vec<(usize, Vec<Document>)> = stream::iter(starts)
        .map(|start| async move {
            let result = source.page(cabinet_id, start, batch).await?;
            Ok::<_, PlatformError>((start, result.items))
        })
        .buffer_unordered(FETCH_CONCURRENCY)
        .try_collect()
        .await?;

    pages.sort_by_key(|(start, _)| *start);
    Ok(pages.into_iter().flat_map(|(_, items)| items).collect())
}
