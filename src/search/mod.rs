//! Search index abstraction.
//!
//! An opaque save/delete/query-by-text service. Entries are derived
//! projections of store documents, rebuilt or deleted on every store-level
//! change by the index synchronizer; nothing authors them directly.
use crate::model::Document;
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type SearchResult<T> = Result<T, SearchError>;

/// A text-query hit: the indexed object's external identifier plus its
/// stored field map.
#[derive(Debug, Clone)]
pub struct SearchHit {
    pub object_id: String,
    pub fields: Document,
}

#[async_trait]
pub trait SearchIndex: Send + Sync {
    /// Create-or-replace the entry for `object_id` in the named index.
    async fn save(&self, index: &str, object_id: &str, fields: Document) -> SearchResult<()>;

    /// Remove the entry for `object_id`; removing a missing entry is a no-op.
    async fn delete(&self, index: &str, object_id: &str) -> SearchResult<()>;

    /// Free-text query over the named index.
    async fn query(&self, index: &str, text: &str) -> SearchResult<Vec<SearchHit>>;
}
