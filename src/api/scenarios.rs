/// Scenario management endpoints

use super::{ApiError, AppState};
use crate::scenario::{NewScenario, Scenario, ScenarioPatch};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/users", post(register_user))
        .route("/api/scenarios", post(create_scenario).get(list_scenarios))
        .route(
            "/api/scenarios/{id}",
            get(get_scenario)
                .put(update_scenario)
                .delete(delete_scenario),
        )
        .route("/api/scenarios/{id}/nodes", get(list_nodes))
        .route("/api/scenarios/{id}/connections", get(list_connections))
        .route("/api/scenarios/{id}/executions", get(list_executions))
        .route("/api/scenarios/{id}/execute", post(execute_scenario))
        .route("/api/checkout/{slug}", get(resolve_checkout))
}

#[derive(Deserialize)]
struct RegisterUserRequest {
    id: String,
    name: String,
}

async fn register_user(
    State(state): State<AppState>,
    Json(req): Json<RegisterUserRequest>,
) -> Result<Json<Value>, ApiError> {
    state.store.register_user(&req.id, &req.name).await?;
    let user = state.store.get_user(&req.id).await?;
    Ok(Json(json!(user)))
}

/// Resolve a checkout scenario by its public slug, as storefront pages do
async fn resolve_checkout(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let scenario = state
        .store
        .get_scenario_by_slug(&slug)
        .await?
        .ok_or_else(|| {
            crate::error::StoreError::not_found(format!("No checkout found for slug {slug}"))
        })?;
    let nodes = state.store.list_nodes(&scenario.id).await?;
    Ok(Json(json!({ "scenario": scenario, "nodes": nodes })))
}

#[derive(Deserialize)]
struct ListScenariosQuery {
    owner_id: String,
}

async fn list_scenarios(
    State(state): State<AppState>,
    Query(query): Query<ListScenariosQuery>,
) -> Result<Json<Vec<Scenario>>, ApiError> {
    let scenarios = state.store.list_scenarios(&query.owner_id).await?;
    Ok(Json(scenarios))
}

async fn create_scenario(
    State(state): State<AppState>,
    Json(req): Json<NewScenario>,
) -> Result<(StatusCode, Json<Scenario>), ApiError> {
    let id = state.store.create_scenario(req).await?;
    super::refresh_registry(&state.registry, &id).await;
    let scenario = state.store.get_scenario(&id).await?;
    tracing::info!("created scenario {} ({})", scenario.name, scenario.id);
    Ok((StatusCode::CREATED, Json(scenario)))
}

async fn get_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Scenario>, ApiError> {
    let scenario = state.store.get_scenario(&id).await?;
    Ok(Json(scenario))
}

async fn update_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ScenarioPatch>,
) -> Result<Json<Scenario>, ApiError> {
    state.store.update_scenario(&id, patch).await?;
    super::refresh_registry(&state.registry, &id).await;
    let scenario = state.store.get_scenario(&id).await?;
    Ok(Json(scenario))
}

async fn delete_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.store.delete_scenario(&id).await?;
    state.registry.remove_scenario(&id);
    tracing::info!("deleted scenario {id}");
    Ok(Json(json!({ "deleted": true })))
}

async fn list_nodes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    // 404 for unknown scenarios rather than an empty list
    state.store.get_scenario(&id).await?;
    let nodes = state.store.list_nodes(&id).await?;
    Ok(Json(json!(nodes)))
}

async fn list_connections(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.store.get_scenario(&id).await?;
    let connections = state.store.list_connections(&id).await?;
    Ok(Json(json!(connections)))
}

#[derive(Deserialize)]
struct ListExecutionsQuery {
    limit: Option<i64>,
}

async fn list_executions(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ListExecutionsQuery>,
) -> Result<Json<Value>, ApiError> {
    state.store.get_scenario(&id).await?;
    let executions = state
        .tracker
        .list_scenario_executions(&id, query.limit.unwrap_or(20))
        .await?;
    Ok(Json(json!(executions)))
}

async fn execute_scenario(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Option<Json<Value>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let input = payload.map(|Json(v)| v).unwrap_or_else(|| json!({}));
    let execution_id = state
        .runner
        .start(&id, json!({ "kind": "manual" }), input)
        .await?;
    tracing::info!("manual execution {execution_id} started for scenario {id}");
    Ok((StatusCode::ACCEPTED, Json(json!({ "execution_id": execution_id }))))
}
