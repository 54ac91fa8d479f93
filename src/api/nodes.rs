/// Node management and trigger configuration endpoints

use super::{ApiError, AppState};
use crate::scenario::{NewNode, Node, NodePatch};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/nodes", post(create_node))
        .route(
            "/api/nodes/{id}",
            get(get_node).put(update_node).delete(delete_node),
        )
        .route("/api/nodes/{id}/webhook", post(generate_webhook).get(get_webhook))
        .route("/api/nodes/{id}/polling", put(configure_polling))
}

async fn create_node(
    State(state): State<AppState>,
    Json(req): Json<NewNode>,
) -> Result<(StatusCode, Json<Node>), ApiError> {
    let scenario_id = req.scenario_id.clone();
    let id = state.store.create_node(req).await?;
    super::refresh_registry(&state.registry, &scenario_id).await;
    let node = state.store.get_node(&id).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

async fn get_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Node>, ApiError> {
    let node = state.store.get_node(&id).await?;
    Ok(Json(node))
}

async fn update_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<NodePatch>,
) -> Result<Json<Node>, ApiError> {
    state.store.update_node(&id, patch).await?;
    let node = state.store.get_node(&id).await?;
    super::refresh_registry(&state.registry, &node.scenario_id).await;
    Ok(Json(node))
}

async fn delete_node(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    // fetch first so we know which scenario to refresh afterwards
    let node = state.store.get_node(&id).await?;
    state.store.delete_node(&id).await?;
    super::refresh_registry(&state.registry, &node.scenario_id).await;
    Ok(Json(json!({ "deleted": true })))
}

async fn generate_webhook(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let url = state.dispatcher.generate_webhook_url(&id).await?;
    tracing::info!("webhook URL issued for node {id}");
    Ok(Json(json!({ "url": url })))
}

async fn get_webhook(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let url = state.dispatcher.node_webhook_url(&id).await?;
    Ok(Json(json!({ "url": url })))
}

#[derive(Deserialize)]
struct PollingRequest {
    interval_minutes: i64,
    enabled: bool,
}

async fn configure_polling(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<PollingRequest>,
) -> Result<Json<Node>, ApiError> {
    state
        .dispatcher
        .configure_polling(&id, req.interval_minutes, req.enabled)
        .await?;
    let node = state.store.get_node(&id).await?;
    Ok(Json(node))
}
