mod common;
mod http_helpers;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use catalog::app::{build_router, AppState};
use catalog::auth::directory::{InMemoryDirectory, UserDirectory};
use catalog::auth::service::AuthService;
use catalog::bus::memory::InMemoryBus;
use catalog::bus::MessageBus;
use catalog::commands::{CommandConsumer, CommandPublisher, CommandStreams};
use catalog::model::UserRecord;
use catalog::query::QueryPlanner;
use catalog::search::memory::InMemorySearchIndex;
use catalog::search::SearchIndex;
use catalog::store::memory::InMemoryStore;
use catalog::store::DocumentStore;
use catalog::sync::{IndexSynchronizer, RoleSynchronizer};
use common::read_json;
use http_helpers::{authed_json_request, authed_request};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

struct Pipeline {
    app: axum::Router,
    token: String,
    store: Arc<InMemoryStore>,
    directory: Arc<InMemoryDirectory>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

/// Full wiring: router, command consumer, and both synchronizers, all over
/// in-memory backends, mirroring the binary's runtime.
async fn pipeline() -> Pipeline {
    let store = Arc::new(InMemoryStore::new());
    let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new());
    let search: Arc<dyn SearchIndex> = Arc::new(InMemorySearchIndex::new());
    let directory = Arc::new(InMemoryDirectory::new());
    directory
        .upsert(UserRecord {
            uid: "admin-1".to_string(),
            email: "admin@example.com".to_string(),
            admin: true,
        })
        .await;

    let auth = Arc::new(AuthService::new("test-secret", directory.clone()));
    let token = auth.issue_token("admin-1").expect("token");
    let publisher = Arc::new(CommandPublisher::new(bus.clone()));
    let planner = Arc::new(QueryPlanner::new(
        store.clone(),
        search.clone(),
        "products",
        "products",
    ));

    let streams = CommandStreams::subscribe(bus.as_ref())
        .await
        .expect("subscribe");
    let product_changes = store.watch("products").await;
    let user_changes = store.watch("users").await;
    let consumer = Arc::new(CommandConsumer::new(store.clone(), "products"));

    let workers = vec![
        tokio::spawn(consumer.run(streams)),
        tokio::spawn(IndexSynchronizer::new(search, "products").run(product_changes)),
        tokio::spawn(RoleSynchronizer::new(directory.clone()).run(user_changes)),
    ];

    Pipeline {
        app: build_router(AppState::new(auth, publisher, planner)),
        token,
        store,
        directory,
        workers,
    }
}

/// Poll until `check` passes; the pipeline is asynchronous end to end, so
/// every assertion about its effects has to wait for the workers.
async fn eventually<F, Fut>(mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

async fn list_products(app: &axum::Router) -> serde_json::Value {
    let request = Request::builder()
        .uri("/products")
        .body(Body::empty())
        .expect("request");
    let response = app.clone().oneshot(request).await.expect("list");
    assert_eq!(response.status(), StatusCode::OK);
    read_json(response).await
}

#[tokio::test]
async fn add_update_remove_flow_reaches_store_and_search_index() {
    let pipeline = pipeline().await;

    // Add: acknowledged immediately, applied asynchronously.
    let create = authed_json_request(
        "POST",
        "/products",
        &pipeline.token,
        serde_json::json!({ "name": "Fanta Uva", "price": 3.99 }),
    );
    let response = pipeline.app.clone().oneshot(create).await.expect("post");
    assert_eq!(response.status(), StatusCode::CREATED);

    let app = pipeline.app.clone();
    assert!(
        eventually(|| {
            let app = app.clone();
            async move { list_products(&app).await.as_array().expect("array").len() == 1 }
        })
        .await,
        "add command never reached the store"
    );

    let products = list_products(&pipeline.app).await;
    let id = products[0]["id"].as_str().expect("id").to_string();

    // The index synchronizer projected the insert; search now serves it.
    let app = pipeline.app.clone();
    assert!(
        eventually(|| {
            let app = app.clone();
            async move {
                let request = Request::builder()
                    .uri("/products?search=fanta")
                    .body(Body::empty())
                    .expect("request");
                let response = app.clone().oneshot(request).await.expect("search");
                let payload = read_json(response).await;
                payload.as_array().is_some_and(|hits| hits.len() == 1)
            }
        })
        .await,
        "insert never reached the search index"
    );

    // Patch: merge semantics keep the name.
    let patch = authed_json_request(
        "PATCH",
        &format!("/products/{id}"),
        &pipeline.token,
        serde_json::json!({ "price": 4.5 }),
    );
    let response = pipeline.app.clone().oneshot(patch).await.expect("patch");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let store = pipeline.store.clone();
    let patched_id = id.clone();
    assert!(
        eventually(|| {
            let store = store.clone();
            let id = patched_id.clone();
            async move {
                match store.get("products", &id).await.expect("get") {
                    Some(doc) => {
                        doc.get("price") == Some(&serde_json::json!(4.5))
                            && doc.get("name") == Some(&serde_json::json!("Fanta Uva"))
                    }
                    None => false,
                }
            }
        })
        .await,
        "patch never merged into the store"
    );

    // Remove: document and index entry both disappear.
    let delete = authed_request("DELETE", &format!("/products/{id}"), &pipeline.token);
    let response = pipeline.app.clone().oneshot(delete).await.expect("delete");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let app = pipeline.app.clone();
    assert!(
        eventually(|| {
            let app = app.clone();
            async move {
                let listed = list_products(&app).await.as_array().expect("array").is_empty();
                let request = Request::builder()
                    .uri("/products?search=fanta")
                    .body(Body::empty())
                    .expect("request");
                let response = app.clone().oneshot(request).await.expect("search");
                let indexed = read_json(response)
                    .await
                    .as_array()
                    .is_some_and(|hits| hits.is_empty());
                listed && indexed
            }
        })
        .await,
        "remove never propagated"
    );

    for worker in pipeline.workers {
        worker.abort();
    }
}

#[tokio::test]
async fn user_document_writes_drive_the_admin_claim() {
    let pipeline = pipeline().await;
    pipeline
        .directory
        .upsert(UserRecord {
            uid: "u9".to_string(),
            email: "u9@example.com".to_string(),
            admin: false,
        })
        .await;

    pipeline
        .store
        .update(
            "users",
            "u9",
            serde_json::from_value(serde_json::json!({ "role": "admin" })).expect("doc"),
            true,
        )
        .await
        .expect("write user doc");

    let directory = pipeline.directory.clone();
    assert!(
        eventually(|| {
            let directory = directory.clone();
            async move { directory.user_by_uid("u9").await.expect("user").admin }
        })
        .await,
        "role change never reached the directory"
    );

    for worker in pipeline.workers {
        worker.abort();
    }
}
