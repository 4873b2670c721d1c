//! Change-feed synchronizers.
//!
//! # Purpose
//! Background tasks that follow the store's change feeds. The index
//! synchronizer projects product documents into the search index; the role
//! synchronizer projects the `users` collection's `role` field into the
//! directory's `admin` claim. Both are best effort: a failure is logged and
//! never rolls back or blocks the store write that triggered it.
use crate::auth::directory::UserDirectory;
use crate::search::{SearchError, SearchIndex};
use crate::store::DocumentChange;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Projects product changes into the search index.
pub struct IndexSynchronizer {
    search: Arc<dyn SearchIndex>,
    index: String,
}

impl IndexSynchronizer {
    pub fn new(search: Arc<dyn SearchIndex>, index: &str) -> Self {
        Self {
            search,
            index: index.to_string(),
        }
    }

    /// Apply one change: a deletion removes the entry by the before-snapshot
    /// id, anything else upserts the after-snapshot's fields under the
    /// document id.
    pub async fn apply(&self, change: &DocumentChange) -> Result<(), SearchError> {
        match &change.after {
            None => self.search.delete(&self.index, &change.id).await,
            Some(after) => {
                self.search
                    .save(&self.index, &change.id, after.clone())
                    .await
            }
        }
    }

    pub async fn run(self, mut changes: broadcast::Receiver<DocumentChange>) {
        loop {
            match changes.recv().await {
                Ok(change) => {
                    if let Err(err) = self.apply(&change).await {
                        tracing::error!(id = %change.id, error = %err, "search index update failed");
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    // The index is eventually consistent at best; after a lag
                    // the missed documents stay stale until their next write.
                    tracing::warn!(missed, "index synchronizer lagged behind the change feed");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

/// Projects user-document changes into directory custom claims: `admin` is
/// true iff the document's `role` field equals `"admin"`. Deletions are
/// skipped entirely.
pub struct RoleSynchronizer {
    directory: Arc<dyn UserDirectory>,
}

impl RoleSynchronizer {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    pub async fn apply(&self, change: &DocumentChange) {
        let Some(after) = &change.after else {
            return;
        };
        let admin = after.get("role").and_then(|role| role.as_str()) == Some("admin");
        if let Err(err) = self.directory.set_admin(&change.id, admin).await {
            tracing::warn!(uid = %change.id, error = %err, "role sync skipped");
        }
    }

    pub async fn run(self, mut changes: broadcast::Receiver<DocumentChange>) {
        loop {
            match changes.recv().await {
                Ok(change) => self.apply(&change).await,
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "role synchronizer lagged behind the change feed");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::directory::InMemoryDirectory;
    use crate::model::{Document, UserRecord};
    use crate::search::memory::InMemorySearchIndex;
    use serde_json::{json, Value};

    fn doc(value: serde_json::Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn change(id: &str, before: Option<Document>, after: Option<Document>) -> DocumentChange {
        DocumentChange {
            collection: "products".to_string(),
            id: id.to_string(),
            before,
            after,
        }
    }

    #[tokio::test]
    async fn write_changes_upsert_into_the_index_and_never_delete() {
        let search = Arc::new(InMemorySearchIndex::new());
        let synchronizer = IndexSynchronizer::new(search.clone(), "products");

        synchronizer
            .apply(&change("p1", None, Some(doc(json!({ "name": "Soda" })))))
            .await
            .expect("apply");
        let hits = search.query("products", "soda").await.expect("query");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object_id, "p1");

        // A subsequent update replaces the projection.
        synchronizer
            .apply(&change(
                "p1",
                Some(doc(json!({ "name": "Soda" }))),
                Some(doc(json!({ "name": "Cola" }))),
            ))
            .await
            .expect("apply");
        assert!(search.query("products", "soda").await.expect("query").is_empty());
        assert_eq!(search.query("products", "cola").await.expect("query").len(), 1);
    }

    #[tokio::test]
    async fn delete_changes_remove_the_entry_and_never_save() {
        let search = Arc::new(InMemorySearchIndex::new());
        let synchronizer = IndexSynchronizer::new(search.clone(), "products");

        synchronizer
            .apply(&change("p1", None, Some(doc(json!({ "name": "Soda" })))))
            .await
            .expect("seed");
        synchronizer
            .apply(&change("p1", Some(doc(json!({ "name": "Soda" }))), None))
            .await
            .expect("delete");
        assert!(search.query("products", "soda").await.expect("query").is_empty());
    }

    #[tokio::test]
    async fn role_changes_flip_the_admin_claim() {
        let directory = Arc::new(InMemoryDirectory::new());
        directory
            .upsert(UserRecord {
                uid: "u1".to_string(),
                email: "a@example.com".to_string(),
                admin: false,
            })
            .await;
        let synchronizer = RoleSynchronizer::new(directory.clone());

        synchronizer
            .apply(&change("u1", None, Some(doc(json!({ "role": "admin" })))))
            .await;
        assert!(directory.user_by_uid("u1").await.expect("user").admin);

        synchronizer
            .apply(&change(
                "u1",
                Some(doc(json!({ "role": "admin" }))),
                Some(doc(json!({ "role": "customer" }))),
            ))
            .await;
        assert!(!directory.user_by_uid("u1").await.expect("user").admin);
    }

    #[tokio::test]
    async fn user_deletions_are_skipped() {
        let directory = Arc::new(InMemoryDirectory::new());
        directory
            .upsert(UserRecord {
                uid: "u1".to_string(),
                email: "a@example.com".to_string(),
                admin: true,
            })
            .await;
        let synchronizer = RoleSynchronizer::new(directory.clone());

        synchronizer
            .apply(&change("u1", Some(doc(json!({ "role": "admin" }))), None))
            .await;
        // The claim stays as it was; deletion handling belongs elsewhere.
        assert!(directory.user_by_uid("u1").await.expect("user").admin);
    }
}
