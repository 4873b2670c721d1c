//! Query planner for product reads.
//!
//! # Purpose
//! Builds a read plan from request-supplied conditions and executes it
//! against the primary store or, when a free-text search term is present,
//! the search index. A search term routes the whole query to the index and
//! every structured condition is ignored for that request; the original
//! system behaves this way on purpose, so this one does too.
use crate::model::{Document, Product};
use crate::search::{SearchError, SearchIndex};
use crate::store::{Direction, DocumentStore, StoreError, StructuredQuery};
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;

/// Fields a list read may order by. Anything else is silently ignored.
const ORDERABLE_FIELDS: [&str; 4] = ["name", "description", "category", "price"];

/// Conditions deserialized from the list-read query string. `limit` stays a
/// string until planning; an unparsable value means "no explicit cap".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductConditions {
    pub id: Option<String>,
    pub name: Option<String>,
    pub limit: Option<String>,
    pub order: Option<String>,
    #[serde(rename = "startAfter")]
    pub start_after: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Error)]
pub enum QueryError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Search(#[from] SearchError),
}

pub struct QueryPlanner {
    store: Arc<dyn DocumentStore>,
    search: Arc<dyn SearchIndex>,
    collection: String,
    index: String,
}

impl QueryPlanner {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        search: Arc<dyn SearchIndex>,
        collection: &str,
        index: &str,
    ) -> Self {
        Self {
            store,
            search,
            collection: collection.to_string(),
            index: index.to_string(),
        }
    }

    /// Execute a list read. Re-executes the plan on every call.
    pub async fn get(&self, conditions: &ProductConditions) -> Result<Vec<Product>, QueryError> {
        if let Some(term) = conditions.search.as_deref().filter(|term| !term.is_empty()) {
            return Ok(self.search_products(term).await?);
        }
        Ok(self.structured_query(conditions).await?)
    }

    /// Single-item read by id.
    pub async fn get_one(&self, id: &str) -> Result<Option<Product>, StoreError> {
        let document = self.store.get(&self.collection, id).await?;
        Ok(document.and_then(|document| Product::from_document(id, document)))
    }

    async fn search_products(&self, term: &str) -> Result<Vec<Product>, SearchError> {
        let hits = self.search.query(&self.index, term).await?;
        Ok(hits
            .into_iter()
            .filter_map(|hit| to_product(&hit.object_id, hit.fields))
            .collect())
    }

    async fn structured_query(
        &self,
        conditions: &ProductConditions,
    ) -> Result<Vec<Product>, StoreError> {
        let mut query = StructuredQuery {
            filters: equality_filters(conditions),
            order: parse_order(conditions.order.as_deref()),
            limit: parse_limit(conditions.limit.as_deref()),
            start_after: None,
        };

        if let Some(anchor) = &conditions.start_after {
            // Read the anchor first; a cursor pointing at a deleted document
            // is dropped rather than failing the whole read.
            if self.store.get(&self.collection, anchor).await?.is_some() {
                query.start_after = Some(anchor.clone());
            }
        }

        let rows = self.store.query(&self.collection, query).await?;
        Ok(rows
            .into_iter()
            .filter_map(|(id, document)| to_product(&id, document))
            .collect())
    }
}

fn to_product(id: &str, document: Document) -> Option<Product> {
    let product = Product::from_document(id, document);
    if product.is_none() {
        tracing::warn!(id, "skipping document that does not decode as a product");
    }
    product
}

fn equality_filters(conditions: &ProductConditions) -> Vec<(String, Value)> {
    let mut filters = Vec::new();
    if let Some(id) = &conditions.id {
        filters.push(("id".to_string(), Value::String(id.clone())));
    }
    if let Some(name) = &conditions.name {
        filters.push(("name".to_string(), Value::String(name.clone())));
    }
    filters
}

fn parse_order(order: Option<&str>) -> Option<(String, Direction)> {
    let order = order?;
    let (field, direction) = match order.strip_prefix('-') {
        Some(field) => (field, Direction::Descending),
        None => (order, Direction::Ascending),
    };
    let field = field.to_lowercase();
    if ORDERABLE_FIELDS.contains(&field.as_str()) {
        Some((field, direction))
    } else {
        // Unknown fields are ignored, not an error.
        None
    }
}

fn parse_limit(limit: Option<&str>) -> Option<usize> {
    // 0, absent, or unparsable all mean "no explicit cap".
    limit
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
}
