/// Execution polling endpoints
///
/// Dashboards poll `/api/executions` for in-flight runs and fetch per-node
/// detail on demand; the listing is served by a partial index on unfinished
/// rows so it stays cheap regardless of history size.

use super::{ApiError, AppState};
use crate::execution::{ExecutionDetails, ExecutionSummary};
use axum::{
    extract::{Path, Query, State},
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/executions", get(list_active))
        .route("/api/executions/{id}", get(get_execution))
}

#[derive(Deserialize)]
struct ListActiveQuery {
    limit: Option<i64>,
}

async fn list_active(
    State(state): State<AppState>,
    Query(query): Query<ListActiveQuery>,
) -> Result<Json<Vec<ExecutionSummary>>, ApiError> {
    let executions = state
        .tracker
        .list_active_executions(query.limit.unwrap_or(50))
        .await?;
    Ok(Json(executions))
}

async fn get_execution(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExecutionDetails>, ApiError> {
    let details = state.tracker.get_execution(&id).await?;
    Ok(Json(details))
}
