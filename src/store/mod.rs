//! Document store abstraction.
//!
//! The store is an opaque collection/key document database: single-document
//! get/insert/update/delete plus an ordered, cursor-capable structured query.
//! Every write to a collection emits a [`DocumentChange`] on that
//! collection's change feed so secondary projections (the search index, user
//! custom claims) can follow along without coupling to the writer.
use crate::model::Document;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use thiserror::Error;
use tokio::sync::broadcast;

pub mod memory;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Sort direction for a structured query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// A structured read plan executed by the store.
///
/// `filters` are field equality checks; the pseudo-field `"id"` matches the
/// document key. `start_after` names a document id whose position in the
/// executed ordering the results must come strictly after.
#[derive(Debug, Clone, Default)]
pub struct StructuredQuery {
    pub filters: Vec<(String, Value)>,
    pub order: Option<(String, Direction)>,
    pub limit: Option<usize>,
    pub start_after: Option<String>,
}

/// Before/after snapshot pair emitted once per write to a collection.
///
/// `before` is absent on insert, `after` is absent on delete. Both carry the
/// full field map, never a diff.
#[derive(Debug, Clone)]
pub struct DocumentChange {
    pub collection: String,
    pub id: String,
    pub before: Option<Document>,
    pub after: Option<Document>,
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a single document by id. `Ok(None)` when absent.
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Insert a new document and return its store-assigned id.
    async fn insert(&self, collection: &str, document: Document) -> StoreResult<String>;

    /// Update a document. `merge = true` keeps fields not present in
    /// `document` (partial update); `merge = false` replaces the whole field
    /// map. Updating a missing id creates it (last write wins, no
    /// transactions).
    async fn update(
        &self,
        collection: &str,
        id: &str,
        document: Document,
        merge: bool,
    ) -> StoreResult<()>;

    /// Delete a document by id. Deleting a missing id is a no-op.
    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()>;

    /// Execute a structured query, returning `(id, document)` pairs in the
    /// requested order.
    async fn query(
        &self,
        collection: &str,
        query: StructuredQuery,
    ) -> StoreResult<Vec<(String, Document)>>;

    /// Subscribe to the change feed for a collection.
    async fn watch(&self, collection: &str) -> broadcast::Receiver<DocumentChange>;
}

/// Total order over JSON values used for query ordering: null < bool <
/// number < string < array < object, with ties broken by the caller (the
/// memory store falls back to the document id).
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(value: &Value) -> u8 {
        match value {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a).cmp(&rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn values_order_across_types_by_rank() {
        assert_eq!(compare_values(&json!(null), &json!(1)), Ordering::Less);
        assert_eq!(compare_values(&json!(1), &json!("a")), Ordering::Less);
        assert_eq!(compare_values(&json!("a"), &json!("b")), Ordering::Less);
        assert_eq!(compare_values(&json!(2.5), &json!(2)), Ordering::Greater);
    }
}
