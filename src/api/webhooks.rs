/// Incoming webhook dispatch
///
/// External systems call `/webhook/{node_id}?token=...` to fire a trigger
/// node. The token is verified against the node's current webhook state, so a
/// regenerated URL invalidates earlier ones immediately. Any HTTP method is
/// accepted; the body, when it parses as JSON, becomes the execution input.

use super::{ApiError, AppState};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    routing::any,
    Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

pub fn routes() -> Router<AppState> {
    Router::new().route("/webhook/{node_id}", any(handle_webhook))
}

#[derive(Deserialize)]
struct WebhookQuery {
    token: Option<String>,
}

async fn handle_webhook(
    State(state): State<AppState>,
    Path(node_id): Path<String>,
    Query(query): Query<WebhookQuery>,
    body: String,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let token = query.token.unwrap_or_default();
    let node = state.dispatcher.verify_webhook(&node_id, &token).await?;

    let payload: Value = serde_json::from_str(&body).unwrap_or(Value::Null);
    let execution_id = state
        .runner
        .start(
            &node.scenario_id,
            json!({ "kind": "webhook", "node_id": node_id }),
            payload,
        )
        .await?;

    tracing::info!(
        "webhook on node {node_id} started execution {execution_id} for scenario {}",
        node.scenario_id
    );
    Ok((StatusCode::ACCEPTED, Json(json!({ "execution_id": execution_id }))))
}
