//! API error types and helpers.
//!
//! # Purpose
//! Centralizes HTTP error response construction so every denial and
//! not-found path returns the same `{success: false, msg}` body shape.
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Body of every non-2xx response: `success` is always false and `msg` is a
/// short machine-stable string.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub msg: String,
}

/// Structured API error returned by handlers. Couples an HTTP status code
/// with the JSON error body and implements `IntoResponse` for axum.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn api_error(status: StatusCode, msg: &str) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            success: false,
            msg: msg.to_string(),
        },
    }
}

/// 401: no subject could be resolved.
pub fn api_unauthorized(msg: &str) -> ApiError {
    api_error(StatusCode::UNAUTHORIZED, msg)
}

/// 403: subject resolved but lacks rights.
pub fn api_forbidden(msg: &str) -> ApiError {
    api_error(StatusCode::FORBIDDEN, msg)
}

/// 404: no matching document.
pub fn api_not_found(msg: &str) -> ApiError {
    api_error(StatusCode::NOT_FOUND, msg)
}

/// 400: malformed request.
pub fn api_bad_request(msg: &str) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, msg)
}

/// 500: infrastructure failure. Details are logged server-side; the client
/// gets only the generic message.
pub fn api_internal(msg: &str, err: &dyn std::error::Error) -> ApiError {
    tracing::error!(error = %err, "catalog infrastructure error");
    api_error(StatusCode::INTERNAL_SERVER_ERROR, msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_build_expected_statuses_and_body_shape() {
        let unauthorized = api_unauthorized("Access denied");
        assert_eq!(unauthorized.status, StatusCode::UNAUTHORIZED);
        assert!(!unauthorized.body.success);
        assert_eq!(unauthorized.body.msg, "Access denied");

        let forbidden = api_forbidden("Access denied");
        assert_eq!(forbidden.status, StatusCode::FORBIDDEN);

        let not_found = api_not_found("Product not found");
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert_eq!(not_found.body.msg, "Product not found");

        let bad_request = api_bad_request("malformed update body");
        assert_eq!(bad_request.status, StatusCode::BAD_REQUEST);

        let err = std::io::Error::other("boom");
        let internal = api_internal("storage failed", &err);
        assert_eq!(internal.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.body.msg, "storage failed");
    }
}
