/// Connection management endpoints

use super::{ApiError, AppState};
use crate::scenario::{NewConnection, NodeConnection};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{post, put},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/connections", post(create_connection))
        .route(
            "/api/connections/{id}",
            put(update_connection).delete(delete_connection),
        )
}

async fn create_connection(
    State(state): State<AppState>,
    Json(req): Json<NewConnection>,
) -> Result<(StatusCode, Json<NodeConnection>), ApiError> {
    let scenario_id = req.scenario_id.clone();
    let id = state.store.create_connection(req).await?;
    super::refresh_registry(&state.registry, &scenario_id).await;
    let connection = state.store.get_connection(&id).await?;
    Ok((StatusCode::CREATED, Json(connection)))
}

#[derive(Deserialize)]
struct UpdateConnectionRequest {
    mapping: Option<String>,
}

async fn update_connection(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateConnectionRequest>,
) -> Result<Json<NodeConnection>, ApiError> {
    state.store.update_connection(&id, req.mapping).await?;
    let connection = state.store.get_connection(&id).await?;
    super::refresh_registry(&state.registry, &connection.scenario_id).await;
    Ok(Json(connection))
}

async fn delete_connection(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let connection = state.store.get_connection(&id).await?;
    state.store.delete_connection(&id).await?;
    super::refresh_registry(&state.registry, &connection.scenario_id).await;
    Ok(Json(json!({ "deleted": true })))
}
