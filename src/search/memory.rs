//! In-memory implementation of the search index.
//!
//! Good enough for development and tests: a query matches when the needle
//! occurs case-insensitively in any string field of an entry. Hits come back
//! ordered by object id so results are deterministic.
use super::{SearchHit, SearchIndex, SearchResult};
use crate::model::Document;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Default)]
pub struct InMemorySearchIndex {
    indexes: Arc<RwLock<HashMap<String, HashMap<String, Document>>>>,
}

impl InMemorySearchIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SearchIndex for InMemorySearchIndex {
    async fn save(&self, index: &str, object_id: &str, fields: Document) -> SearchResult<()> {
        let mut indexes = self.indexes.write().await;
        indexes
            .entry(index.to_string())
            .or_default()
            .insert(object_id.to_string(), fields);
        Ok(())
    }

    async fn delete(&self, index: &str, object_id: &str) -> SearchResult<()> {
        let mut indexes = self.indexes.write().await;
        if let Some(entries) = indexes.get_mut(index) {
            entries.remove(object_id);
        }
        Ok(())
    }

    async fn query(&self, index: &str, text: &str) -> SearchResult<Vec<SearchHit>> {
        let needle = text.to_lowercase();
        let indexes = self.indexes.read().await;
        let mut hits: Vec<SearchHit> = indexes
            .get(index)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(_, fields)| matches(fields, &needle))
                    .map(|(object_id, fields)| SearchHit {
                        object_id: object_id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        hits.sort_by(|a, b| a.object_id.cmp(&b.object_id));
        Ok(hits)
    }
}

fn matches(fields: &Document, needle: &str) -> bool {
    fields.values().any(|value| match value {
        Value::String(text) => text.to_lowercase().contains(needle),
        _ => false,
    })
}
