//! Authorization gate for mutating requests.
//!
//! # Purpose
//! Decides per request whether the caller may perform a mutation. Reads pass
//! unconditionally; everything else requires a bearer token resolving to a
//! user whose `admin` claim is set.
//!
//! # Notes
//! The gate runs as router middleware ahead of the product handlers, so a
//! denial is written exactly once and no handler executes after it.
use super::service::AuthService;
use crate::api::error::{api_forbidden, api_unauthorized, ApiError};
use crate::app::AppState;
use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

const ACCESS_DENIED: &str = "Access denied";

#[derive(Clone)]
pub struct AuthorizationGate {
    auth: Arc<AuthService>,
}

impl AuthorizationGate {
    pub fn new(auth: Arc<AuthService>) -> Self {
        Self { auth }
    }

    /// Allow or deny a request. On denial the returned [`ApiError`] is the
    /// complete response (401 when no subject resolved, 403 when the subject
    /// lacks admin rights); callers must not write another one.
    pub async fn authorize(&self, method: &Method, headers: &HeaderMap) -> Result<(), ApiError> {
        if method == Method::GET {
            return Ok(());
        }

        let token = bearer_token(headers);
        match self.auth.user_by_token(token).await {
            Some(user) if user.admin => Ok(()),
            Some(_) => Err(api_forbidden(ACCESS_DENIED)),
            None => Err(api_unauthorized(ACCESS_DENIED)),
        }
    }
}

/// Middleware wrapper around the gate for the product routes.
pub async fn require_admin(State(state): State<AppState>, request: Request, next: Next) -> Response {
    match state
        .gate
        .authorize(request.method(), request.headers())
        .await
    {
        Ok(()) => next.run(request).await,
        Err(denied) => denied.into_response(),
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(AUTHORIZATION)?.to_str().ok()?;
    // The prefix match is case-sensitive on purpose.
    Some(header.strip_prefix("Bearer ").unwrap_or(header))
}
