//! In-memory implementation of the document store.
//!
//! # Purpose
//! Implements [`DocumentStore`] with `HashMap`s guarded by
//! `tokio::sync::RwLock`. It exists for local development and tests; all
//! state is lost on restart and nothing coordinates across processes.
//!
//! # Change feeds
//! Each collection owns a `tokio::sync::broadcast` channel. Writes publish a
//! [`DocumentChange`] after the map mutation; a subscriber that falls behind
//! the channel capacity observes `Lagged` and must treat its projection as
//! incomplete.
use super::{
    compare_values, Direction, DocumentChange, DocumentStore, StoreResult, StructuredQuery,
};
use crate::model::Document;
use async_trait::async_trait;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// In-memory document store.
///
/// Collections are created implicitly on first write or watch. Document ids
/// are random v4 uuids in simple (hyphen-free) form.
#[derive(Default)]
pub struct InMemoryStore {
    collections: Arc<RwLock<HashMap<String, HashMap<String, Document>>>>,
    changes: Arc<RwLock<HashMap<String, broadcast::Sender<DocumentChange>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn change_sender(&self, collection: &str) -> broadcast::Sender<DocumentChange> {
        if let Some(sender) = self.changes.read().await.get(collection) {
            return sender.clone();
        }
        let mut changes = self.changes.write().await;
        changes
            .entry(collection.to_string())
            .or_insert_with(|| broadcast::channel(CHANGE_CHANNEL_CAPACITY).0)
            .clone()
    }

    async fn notify(
        &self,
        collection: &str,
        id: &str,
        before: Option<Document>,
        after: Option<Document>,
    ) {
        let sender = self.change_sender(collection).await;
        // Send fails when nobody is subscribed; the change feed is
        // best-effort for projections, so that is fine.
        let _ = sender.send(DocumentChange {
            collection: collection.to_string(),
            id: id.to_string(),
            before,
            after,
        });
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.get(id))
            .cloned())
    }

    async fn insert(&self, collection: &str, document: Document) -> StoreResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        {
            let mut collections = self.collections.write().await;
            collections
                .entry(collection.to_string())
                .or_default()
                .insert(id.clone(), document.clone());
        }
        self.notify(collection, &id, None, Some(document)).await;
        Ok(id)
    }

    async fn update(
        &self,
        collection: &str,
        id: &str,
        document: Document,
        merge: bool,
    ) -> StoreResult<()> {
        let (before, after) = {
            let mut collections = self.collections.write().await;
            let docs = collections.entry(collection.to_string()).or_default();
            let before = docs.get(id).cloned();
            let after = if merge {
                let mut merged = before.clone().unwrap_or_default();
                for (key, value) in document {
                    merged.insert(key, value);
                }
                merged
            } else {
                document
            };
            docs.insert(id.to_string(), after.clone());
            (before, after)
        };
        self.notify(collection, id, before, Some(after)).await;
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> StoreResult<()> {
        let before = {
            let mut collections = self.collections.write().await;
            collections
                .get_mut(collection)
                .and_then(|docs| docs.remove(id))
        };
        // Deleting a document that does not exist is a no-op and emits no
        // change, so redelivered remove commands stay harmless.
        if let Some(before) = before {
            self.notify(collection, id, Some(before), None).await;
        }
        Ok(())
    }

    async fn query(
        &self,
        collection: &str,
        query: StructuredQuery,
    ) -> StoreResult<Vec<(String, Document)>> {
        let mut rows: Vec<(String, Document)> = {
            let collections = self.collections.read().await;
            collections
                .get(collection)
                .map(|docs| {
                    docs.iter()
                        .filter(|(id, doc)| matches_filters(id, doc, &query.filters))
                        .map(|(id, doc)| (id.clone(), doc.clone()))
                        .collect()
                })
                .unwrap_or_default()
        };

        rows.sort_by(|(a_id, a_doc), (b_id, b_doc)| {
            let by_field = match &query.order {
                Some((field, direction)) => {
                    let a_value = a_doc.get(field).unwrap_or(&Value::Null);
                    let b_value = b_doc.get(field).unwrap_or(&Value::Null);
                    let ordering = compare_values(a_value, b_value);
                    match direction {
                        Direction::Ascending => ordering,
                        Direction::Descending => ordering.reverse(),
                    }
                }
                None => Ordering::Equal,
            };
            // Ties fall back to the id so cursor pagination has a total order.
            by_field.then_with(|| a_id.cmp(b_id))
        });

        if let Some(anchor) = &query.start_after {
            if let Some(position) = rows.iter().position(|(id, _)| id == anchor) {
                rows.drain(..=position);
            }
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }
        Ok(rows)
    }

    async fn watch(&self, collection: &str) -> broadcast::Receiver<DocumentChange> {
        self.change_sender(collection).await.subscribe()
    }
}

fn matches_filters(id: &str, document: &Document, filters: &[(String, Value)]) -> bool {
    filters.iter().all(|(field, expected)| {
        if field == "id" {
            return Value::String(id.to_string()) == *expected;
        }
        document.get(field) == Some(expected)
    })
}
