/// Polling trigger configuration
///
/// Polling state is node-local: an enabled flag and an interval in minutes,
/// validated at the input boundary. The actual periodic firing is done by the
/// poll scheduler, which asks for due triggers once a minute.

use crate::error::{StoreError, StoreResult};
use crate::scenario::types::{Node, NODE_TYPE_TRIGGER};
use crate::trigger::TriggerDispatcher;
use sqlx::Row;

pub const MIN_POLLING_INTERVAL_MINUTES: i64 = 1;
pub const MAX_POLLING_INTERVAL_MINUTES: i64 = 60;

impl TriggerDispatcher {
    /// Configure polling for a trigger node
    pub async fn configure_polling(
        &self,
        node_id: &str,
        interval_minutes: i64,
        enabled: bool,
    ) -> StoreResult<()> {
        if !(MIN_POLLING_INTERVAL_MINUTES..=MAX_POLLING_INTERVAL_MINUTES)
            .contains(&interval_minutes)
        {
            return Err(StoreError::invalid(format!(
                "Polling interval must be between {MIN_POLLING_INTERVAL_MINUTES} and {MAX_POLLING_INTERVAL_MINUTES} minutes"
            )));
        }

        let node = self.store().get_node(node_id).await?;
        if node.node_type != NODE_TYPE_TRIGGER {
            return Err(StoreError::invalid("Node is not a trigger node"));
        }

        sqlx::query(
            r#"
            UPDATE nodes SET
                polling_enabled = ?, polling_interval_minutes = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(enabled)
        .bind(interval_minutes)
        .bind(chrono::Utc::now().timestamp_millis())
        .bind(node_id)
        .execute(self.store().pool())
        .await?;

        tracing::info!(node_id, interval_minutes, enabled, "configured polling trigger");
        Ok(())
    }

    /// Trigger nodes whose polling interval has elapsed at `now_ms`
    ///
    /// Never-polled triggers are always due.
    pub async fn due_polling_triggers(&self, now_ms: i64) -> StoreResult<Vec<Node>> {
        let rows = sqlx::query(
            r#"
            SELECT id FROM nodes
            WHERE node_type = ? AND polling_enabled = 1
              AND (last_polled_at IS NULL
                   OR last_polled_at + polling_interval_minutes * 60000 <= ?)
            "#,
        )
        .bind(NODE_TYPE_TRIGGER)
        .bind(now_ms)
        .fetch_all(self.store().pool())
        .await?;

        let mut due = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            due.push(self.store().get_node(&id).await?);
        }
        Ok(due)
    }

    /// Stamp a trigger as polled so it waits out its interval again
    pub async fn mark_polled(&self, node_id: &str, now_ms: i64) -> StoreResult<()> {
        sqlx::query("UPDATE nodes SET last_polled_at = ? WHERE id = ?")
            .bind(now_ms)
            .bind(node_id)
            .execute(self.store().pool())
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{memory_store, seed_trigger_node};

    #[tokio::test]
    async fn interval_bounds_are_enforced_at_the_boundary() {
        let store = memory_store().await;
        let (_, node_id) = seed_trigger_node(&store).await;
        let dispatcher = TriggerDispatcher::new(store);

        for bad in [0, -5, 61, 1000] {
            let err = dispatcher
                .configure_polling(&node_id, bad, true)
                .await
                .unwrap_err();
            assert!(matches!(err, StoreError::InvalidArgument(_)), "{bad}");
        }
        dispatcher.configure_polling(&node_id, 1, true).await.unwrap();
        dispatcher.configure_polling(&node_id, 60, true).await.unwrap();
    }

    #[tokio::test]
    async fn due_triggers_respect_interval_and_last_polled() {
        let store = memory_store().await;
        let (_, node_id) = seed_trigger_node(&store).await;
        let dispatcher = TriggerDispatcher::new(store);
        dispatcher.configure_polling(&node_id, 5, true).await.unwrap();

        let t0 = 1_000_000_000_000;
        // Never polled: due immediately
        let due = dispatcher.due_polling_triggers(t0).await.unwrap();
        assert_eq!(due.len(), 1);

        dispatcher.mark_polled(&node_id, t0).await.unwrap();
        assert!(dispatcher
            .due_polling_triggers(t0 + 4 * 60_000)
            .await
            .unwrap()
            .is_empty());
        assert_eq!(
            dispatcher
                .due_polling_triggers(t0 + 5 * 60_000)
                .await
                .unwrap()
                .len(),
            1
        );
    }

    #[tokio::test]
    async fn disabled_triggers_are_never_due() {
        let store = memory_store().await;
        let (_, node_id) = seed_trigger_node(&store).await;
        let dispatcher = TriggerDispatcher::new(store);
        dispatcher
            .configure_polling(&node_id, 1, false)
            .await
            .unwrap();

        assert!(dispatcher
            .due_polling_triggers(i64::MAX)
            .await
            .unwrap()
            .is_empty());
    }
}
