//! Catalog HTTP application wiring.
//!
//! # Purpose
//! Builds the axum router and defines the shared application state injected
//! into handlers. Route composition lives here to keep `main` small and the
//! router testable with `tower::ServiceExt`.
use crate::api;
use crate::auth::gate::{require_admin, AuthorizationGate};
use crate::auth::service::AuthService;
use crate::commands::CommandPublisher;
use crate::query::QueryPlanner;
use axum::routing::get;
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub gate: AuthorizationGate,
    pub publisher: Arc<CommandPublisher>,
    pub planner: Arc<QueryPlanner>,
}

impl AppState {
    pub fn new(
        auth: Arc<AuthService>,
        publisher: Arc<CommandPublisher>,
        planner: Arc<QueryPlanner>,
    ) -> Self {
        let gate = AuthorizationGate::new(auth.clone());
        Self {
            auth,
            gate,
            publisher,
            planner,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    // The gate runs ahead of every product handler, so denials are written
    // exactly once and before any body deserialization.
    let products = Router::new()
        .route(
            "/products",
            get(api::products::list_products).post(api::products::create_product),
        )
        .route(
            "/products/:id",
            get(api::products::get_product)
                .put(api::products::replace_product)
                .patch(api::products::patch_product)
                .delete(api::products::delete_product),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .route("/login", axum::routing::post(api::auth::login))
        .merge(products)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
