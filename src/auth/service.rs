//! Credential service.
//!
//! # Purpose
//! Resolves bearer tokens to user records and issues tokens at login time.
//!
//! # Propagation policy
//! Verification and lookup failures are swallowed here and surfaced to
//! callers only as "no user": the gate must never see an error cross this
//! boundary. Failures are logged, not propagated.
use super::directory::{DirectoryError, UserDirectory};
use super::token::{Claims, TokenCodec};
use crate::model::UserRecord;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("user not found: {0}")]
    NotFound(String),
    #[error("token signing failed")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

pub struct AuthService {
    codec: TokenCodec,
    directory: Arc<dyn UserDirectory>,
}

impl AuthService {
    pub fn new(secret: &str, directory: Arc<dyn UserDirectory>) -> Self {
        Self {
            codec: TokenCodec::new(secret),
            directory,
        }
    }

    /// Issue a session token embedding the subject identifier.
    pub fn issue_token(&self, uid: &str) -> Result<String, AuthError> {
        Ok(self.codec.issue(&Claims {
            uid: uid.to_string(),
        })?)
    }

    /// Resolve a bearer token to a user record. Absent/invalid tokens and
    /// directory misses all yield `None`.
    pub async fn user_by_token(&self, token: Option<&str>) -> Option<UserRecord> {
        let token = token?;
        if token.is_empty() {
            return None;
        }
        let claims = self.codec.verify(token)?;
        match self.directory.user_by_uid(&claims.uid).await {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!(uid = %claims.uid, error = %err, "token subject not in directory");
                None
            }
        }
    }

    /// Look up a user by login email.
    pub async fn user_by_email(&self, email: &str) -> Result<UserRecord, AuthError> {
        self.directory.user_by_email(email).await.map_err(|err| {
            let DirectoryError::NotFound(email) = err;
            AuthError::NotFound(email)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::directory::InMemoryDirectory;

    async fn service_with_user(admin: bool) -> AuthService {
        let directory = Arc::new(InMemoryDirectory::new());
        directory
            .upsert(UserRecord {
                uid: "u1".to_string(),
                email: "a@example.com".to_string(),
                admin,
            })
            .await;
        AuthService::new("test-secret", directory)
    }

    #[tokio::test]
    async fn token_resolves_to_the_directory_record() {
        let service = service_with_user(true).await;
        let token = service.issue_token("u1").expect("issue");
        let user = service.user_by_token(Some(&token)).await.expect("user");
        assert_eq!(user.uid, "u1");
        assert!(user.admin);
    }

    #[tokio::test]
    async fn unresolvable_tokens_yield_none_not_errors() {
        let service = service_with_user(true).await;
        assert!(service.user_by_token(None).await.is_none());
        assert!(service.user_by_token(Some("")).await.is_none());
        assert!(service.user_by_token(Some("garbage")).await.is_none());

        // Valid signature but subject no longer in the directory.
        let token = service.issue_token("deleted-user").expect("issue");
        assert!(service.user_by_token(Some(&token)).await.is_none());
    }

    #[tokio::test]
    async fn email_lookup_fails_with_not_found() {
        let service = service_with_user(false).await;
        assert!(service.user_by_email("a@example.com").await.is_ok());
        assert!(matches!(
            service.user_by_email("nobody@example.com").await,
            Err(AuthError::NotFound(_))
        ));
    }
}
