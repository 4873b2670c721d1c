//! Product REST handlers.
//!
//! # Purpose
//! The REST surface for `/products`. Mutations are acknowledged as soon as
//! the command is on the bus (201 for add, 204 for update/remove); the store
//! write happens asynchronously in the consumer, so a read immediately after
//! a mutation may not see it yet. Reads go through the query planner.
use crate::api::error::{api_bad_request, api_internal, api_not_found, ApiError};
use crate::app::AppState;
use crate::model::{Product, ProductFields};
use crate::query::ProductConditions;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::Value;

const PRODUCT_NOT_FOUND: &str = "Product not found";

/// `GET /products`: list products matching the query-string conditions.
pub(crate) async fn list_products(
    Query(conditions): Query<ProductConditions>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = state
        .planner
        .get(&conditions)
        .await
        .map_err(|err| api_internal("failed to list products", &err))?;
    Ok(Json(products))
}

/// `GET /products/:id`: fetch a single product or 404.
pub(crate) async fn get_product(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Product>, ApiError> {
    let product = state
        .planner
        .get_one(&id)
        .await
        .map_err(|err| api_internal("failed to fetch product", &err))?;
    match product {
        Some(product) => Ok(Json(product)),
        None => Err(api_not_found(PRODUCT_NOT_FOUND)),
    }
}

/// `POST /products`: publish an add command with the request body verbatim.
/// No field is required; an empty body is a valid (if empty) product.
pub(crate) async fn create_product(
    State(state): State<AppState>,
    Json(body): Json<ProductFields>,
) -> Result<StatusCode, ApiError> {
    state
        .publisher
        .publish_add(&body)
        .await
        .map_err(|err| api_internal("failed to publish add command", &err))?;
    Ok(StatusCode::CREATED)
}

/// `PUT /products/:id`: publish a full-replace update command.
pub(crate) async fn replace_product(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiError> {
    publish_update(&state, &id, body, false).await
}

/// `PATCH /products/:id`: publish a merge update command.
pub(crate) async fn patch_product(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<StatusCode, ApiError> {
    publish_update(&state, &id, body, true).await
}

async fn publish_update(
    state: &AppState,
    id: &str,
    body: Value,
    partial_update: bool,
) -> Result<StatusCode, ApiError> {
    let fields =
        serde_json::from_value(body).map_err(|_| api_bad_request("malformed update body"))?;
    state
        .publisher
        .publish_update(id, fields, partial_update)
        .await
        .map_err(|err| api_internal("failed to publish update command", &err))?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /products/:id`: publish a remove command.
pub(crate) async fn delete_product(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    state
        .publisher
        .publish_remove(&id)
        .await
        .map_err(|err| api_internal("failed to publish remove command", &err))?;
    Ok(StatusCode::NO_CONTENT)
}
