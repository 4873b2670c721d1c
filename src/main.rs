//! Catalog HTTP service entry point.
//!
//! # Purpose
//! Wires configuration, the in-memory backends, the command pipeline, and
//! the change-feed synchronizers, then starts the API server.
//!
//! # Notes
//! `build_runtime` keeps the wiring testable and `main` minimal. The worker
//! tasks (command consumer, index synchronizer, role synchronizer) run for
//! the lifetime of the server and are aborted on shutdown.
use anyhow::Result;
use catalog::app::{build_router, AppState};
use catalog::auth::directory::{InMemoryDirectory, UserDirectory};
use catalog::auth::service::AuthService;
use catalog::bus::memory::InMemoryBus;
use catalog::bus::MessageBus;
use catalog::commands::{CommandConsumer, CommandPublisher, CommandStreams};
use catalog::config::CatalogConfig;
use catalog::observability;
use catalog::query::QueryPlanner;
use catalog::search::memory::InMemorySearchIndex;
use catalog::search::SearchIndex;
use catalog::store::memory::InMemoryStore;
use catalog::store::DocumentStore;
use catalog::sync::{IndexSynchronizer, RoleSynchronizer};
use std::future::Future;
use std::sync::Arc;
use tokio::task::JoinHandle;

struct CatalogRuntime {
    state: AppState,
    workers: Vec<JoinHandle<()>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = CatalogConfig::from_env_or_yaml()?;
    run_with_shutdown(config, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await
}

async fn run_with_shutdown<F>(config: CatalogConfig, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    observability::init_observability();
    let runtime = build_runtime(&config).await?;
    let app = build_router(runtime.state.clone());

    let addr = config.bind_addr;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "catalog listening");
    tokio::pin!(shutdown);
    tokio::select! {
        result = axum::serve(listener, app.into_make_service()) => {
            result?;
        }
        _ = &mut shutdown => {}
    }

    for worker in &runtime.workers {
        worker.abort();
    }
    for worker in runtime.workers {
        let _ = worker.await;
    }
    Ok(())
}

async fn build_runtime(config: &CatalogConfig) -> Result<CatalogRuntime> {
    let store: Arc<dyn DocumentStore> = Arc::new(InMemoryStore::new());
    let bus: Arc<dyn MessageBus> = Arc::new(InMemoryBus::new());
    let search: Arc<dyn SearchIndex> = Arc::new(InMemorySearchIndex::new());
    let directory: Arc<dyn UserDirectory> = Arc::new(InMemoryDirectory::new());

    let auth = Arc::new(AuthService::new(&config.jwt_secret, directory.clone()));
    let publisher = Arc::new(CommandPublisher::new(bus.clone()));
    let planner = Arc::new(QueryPlanner::new(
        store.clone(),
        search.clone(),
        &config.products_collection,
        &config.search_index,
    ));

    // Subscribe before serving so no early command or write slips past a
    // not-yet-listening worker.
    let streams = CommandStreams::subscribe(bus.as_ref()).await?;
    let product_changes = store.watch(&config.products_collection).await;
    let user_changes = store.watch(&config.users_collection).await;
    let consumer = Arc::new(CommandConsumer::new(
        store.clone(),
        &config.products_collection,
    ));

    let mut workers = Vec::new();
    workers.push(tokio::spawn(consumer.run(streams)));
    workers.push(tokio::spawn(
        IndexSynchronizer::new(search, &config.search_index).run(product_changes),
    ));
    workers.push(tokio::spawn(
        RoleSynchronizer::new(directory).run(user_changes),
    ));

    Ok(CatalogRuntime {
        state: AppState::new(auth, publisher, planner),
        workers,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CatalogConfig {
        CatalogConfig {
            bind_addr: "127.0.0.1:0".parse().expect("bind"),
            jwt_secret: "test-secret".to_string(),
            products_collection: "products".to_string(),
            users_collection: "users".to_string(),
            search_index: "products".to_string(),
        }
    }

    #[tokio::test]
    async fn build_runtime_spawns_the_worker_tasks() {
        let runtime = build_runtime(&test_config()).await.expect("runtime");
        assert_eq!(runtime.workers.len(), 3);
        for worker in runtime.workers {
            worker.abort();
        }
    }

    #[tokio::test]
    async fn run_with_shutdown_starts_and_stops() {
        run_with_shutdown(test_config(), async {
            tokio::time::sleep(std::time::Duration::from_millis(100)).await;
        })
        .await
        .expect("run should stop cleanly");
    }
}
