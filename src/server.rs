/// Server setup and initialization
///
/// Wires together storage, registry, trigger dispatch, the execution runner,
/// and HTTP routes, and provides the application factory for the Axum app.

use crate::{
    api::{create_api_routes, AppState},
    config::Config,
    execution::{AckInvoker, ExecutionRunner, ExecutionTracker},
    scenario::{ScenarioRegistry, ScenarioStore},
    trigger::{PollScheduler, TriggerDispatcher},
};
use anyhow::Result;
use axum::{routing::get, Router};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create the Axum application with all components wired together
pub async fn create_app(config: Config) -> Result<Router> {
    tracing::info!("ensuring data directory exists: {}", config.database.data_dir);
    std::fs::create_dir_all(&config.database.data_dir)
        .map_err(|e| anyhow::anyhow!("Failed to create data directory: {}", e))?;

    let db_path = format!("{}/scenariod.db", config.database.data_dir);
    let options = SqliteConnectOptions::new()
        .filename(&db_path)
        .create_if_missing(true)
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(options).await?;
    tracing::info!("database pool ready: {db_path}");

    let store = ScenarioStore::new(pool);
    store.init_schema().await?;

    let tracker = ExecutionTracker::new(store.clone());
    tracker.init_schema().await?;

    tracing::info!("loading scenarios into registry");
    let registry = Arc::new(ScenarioRegistry::new(store.clone()));
    let owners = store.list_owner_ids().await?;
    registry.init_from_store(&owners).await?;

    let dispatcher = Arc::new(TriggerDispatcher::new(store.clone()));
    let runner = Arc::new(ExecutionRunner::new(
        tracker.clone(),
        Arc::clone(&registry),
        Arc::new(AckInvoker),
    ));

    tracing::info!("starting polling scheduler");
    let scheduler = PollScheduler::new(Arc::clone(&dispatcher), Arc::clone(&runner)).await?;
    tokio::spawn(async move {
        if let Err(e) = scheduler.start().await {
            tracing::error!("failed to start polling scheduler: {e}");
            return;
        }
        // hold the scheduler for the lifetime of the process
        std::future::pending::<()>().await;
    });

    let state = AppState {
        store,
        registry,
        dispatcher,
        tracker,
        runner,
    };

    let app = Router::new()
        .route("/healthz", get(health_check))
        .merge(create_api_routes())
        .with_state(state);

    tracing::info!("application initialized");
    Ok(app)
}

/// Start the HTTP server with the given configuration
pub async fn start_server(config: Config) -> Result<()> {
    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("starting scenariod...");
    let app = create_app(config.clone()).await?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("server listening on http://{bind_addr}");

    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}

async fn health_check() -> &'static str {
    "ok"
}
