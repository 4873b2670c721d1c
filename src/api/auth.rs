//! Authentication endpoint.
use crate::api::error::{api_unauthorized, ApiError};
use crate::app::AppState;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Fixed literal credential check. Deliberately simplified: this system
/// demonstrates the token flow, not password storage.
const LOGIN_PASSWORD: &str = "abc123";

const INVALID_CREDENTIALS: &str = "Invalid credentials";

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// `POST /login`: exchange email + password for a session token embedding
/// the subject identifier.
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let user = match state.auth.user_by_email(&body.email).await {
        Ok(user) => Some(user),
        Err(_) => None,
    };

    match user {
        Some(user) if body.password == LOGIN_PASSWORD => {
            let token = state
                .auth
                .issue_token(&user.uid)
                .map_err(|err| crate::api::error::api_internal("token issue failed", &err))?;
            Ok(Json(TokenResponse { token }))
        }
        _ => Err(api_unauthorized(INVALID_CREDENTIALS)),
    }
}
