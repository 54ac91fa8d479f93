/// Webhook trigger management
///
/// Issues addressable webhook URLs for trigger nodes. Regeneration always
/// mints a fresh token and revokes the previous one in the same UPDATE;
/// there is no grace period during which both validate.

use crate::error::{StoreError, StoreResult};
use crate::scenario::types::{Node, NODE_TYPE_TRIGGER};
use crate::trigger::TriggerDispatcher;
use uuid::Uuid;

fn webhook_url(node_id: &str, token: &str) -> String {
    format!("/webhook/{node_id}?token={token}")
}

impl TriggerDispatcher {
    /// Generate (or regenerate) the webhook URL for a trigger node
    pub async fn generate_webhook_url(&self, node_id: &str) -> StoreResult<String> {
        let node = self.store().get_node(node_id).await?;
        if node.node_type != NODE_TYPE_TRIGGER {
            return Err(StoreError::invalid("Node is not a trigger node"));
        }

        let token = Uuid::new_v4().to_string();
        // Single UPDATE: the old token is gone the instant the new one lands
        sqlx::query(
            r#"
            UPDATE nodes SET webhook_token = ?, webhook_enabled = 1, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&token)
        .bind(chrono::Utc::now().timestamp_millis())
        .bind(node_id)
        .execute(self.store().pool())
        .await?;

        tracing::info!(node_id, "generated webhook URL");
        Ok(webhook_url(node_id, &token))
    }

    /// Current webhook URL for a node, or None if never generated
    pub async fn node_webhook_url(&self, node_id: &str) -> StoreResult<Option<String>> {
        let node = self.store().get_node(node_id).await?;
        Ok(node
            .webhook_token
            .filter(|_| node.webhook_enabled)
            .map(|t| webhook_url(node_id, &t)))
    }

    /// Validate an incoming webhook call against the node's current token
    ///
    /// Returns the node so the caller can start an execution for its scenario.
    pub async fn verify_webhook(&self, node_id: &str, token: &str) -> StoreResult<Node> {
        let node = self.store().get_node(node_id).await?;
        if node.node_type != NODE_TYPE_TRIGGER {
            return Err(StoreError::invalid("Node is not a trigger node"));
        }
        let valid = node.webhook_enabled
            && node
                .webhook_token
                .as_deref()
                .is_some_and(|current| current == token);
        if !valid {
            return Err(StoreError::invalid("Invalid webhook token"));
        }
        Ok(node)
    }
}
