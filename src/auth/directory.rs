//! User directory.
//!
//! # Purpose
//! The auth backend holding user records and their custom claims. It is a
//! separate system from the document store; the role synchronizer projects
//! the `users` collection's `role` field into the `admin` claim here.
use crate::model::UserRecord;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("user not found: {0}")]
    NotFound(String),
}

pub type DirectoryResult<T> = Result<T, DirectoryError>;

#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_by_uid(&self, uid: &str) -> DirectoryResult<UserRecord>;
    async fn user_by_email(&self, email: &str) -> DirectoryResult<UserRecord>;

    /// Set the `admin` custom claim on an existing user.
    async fn set_admin(&self, uid: &str, admin: bool) -> DirectoryResult<()>;

    /// Create or replace a user record.
    async fn upsert(&self, user: UserRecord);
}

/// In-memory directory for development and tests.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: Arc<RwLock<HashMap<String, UserRecord>>>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn user_by_uid(&self, uid: &str) -> DirectoryResult<UserRecord> {
        self.users
            .read()
            .await
            .get(uid)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(uid.to_string()))
    }

    async fn user_by_email(&self, email: &str) -> DirectoryResult<UserRecord> {
        self.users
            .read()
            .await
            .values()
            .find(|user| user.email == email)
            .cloned()
            .ok_or_else(|| DirectoryError::NotFound(email.to_string()))
    }

    async fn set_admin(&self, uid: &str, admin: bool) -> DirectoryResult<()> {
        let mut users = self.users.write().await;
        match users.get_mut(uid) {
            Some(user) => {
                user.admin = admin;
                Ok(())
            }
            None => Err(DirectoryError::NotFound(uid.to_string())),
        }
    }

    async fn upsert(&self, user: UserRecord) {
        self.users.write().await.insert(user.uid.clone(), user);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(uid: &str, email: &str, admin: bool) -> UserRecord {
        UserRecord {
            uid: uid.to_string(),
            email: email.to_string(),
            admin,
        }
    }

    #[tokio::test]
    async fn lookups_by_uid_and_email() {
        let directory = InMemoryDirectory::new();
        directory.upsert(user("u1", "a@example.com", false)).await;

        assert_eq!(
            directory.user_by_uid("u1").await.expect("uid").email,
            "a@example.com"
        );
        assert_eq!(
            directory
                .user_by_email("a@example.com")
                .await
                .expect("email")
                .uid,
            "u1"
        );
        assert!(matches!(
            directory.user_by_uid("missing").await,
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn set_admin_flips_the_claim_and_requires_an_existing_user() {
        let directory = InMemoryDirectory::new();
        directory.upsert(user("u1", "a@example.com", false)).await;

        directory.set_admin("u1", true).await.expect("set");
        assert!(directory.user_by_uid("u1").await.expect("uid").admin);

        assert!(matches!(
            directory.set_admin("ghost", true).await,
            Err(DirectoryError::NotFound(_))
        ));
    }
}
