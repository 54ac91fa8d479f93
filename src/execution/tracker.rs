/// Execution tracking and progress aggregation
///
/// One `scenario_executions` row per run plus one `execution_nodes` row per
/// node of the scenario. Per-node state follows
/// `pending -> running -> {completed | failed}` with terminal states locked;
/// every transition recomputes the aggregate counts and progress in the same
/// transaction, so `completed + running + pending + failed == total` holds at
/// every observable snapshot and progress never regresses.

use crate::error::{StoreError, StoreResult};
use crate::scenario::ScenarioStore;
use serde::Serialize;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

/// Per-node run status within an execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRunStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl NodeRunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRunStatus::Pending => "pending",
            NodeRunStatus::Running => "running",
            NodeRunStatus::Completed => "completed",
            NodeRunStatus::Failed => "failed",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "running" => NodeRunStatus::Running,
            "completed" => NodeRunStatus::Completed,
            "failed" => NodeRunStatus::Failed,
            _ => NodeRunStatus::Pending,
        }
    }

    fn is_terminal(&self) -> bool {
        matches!(self, NodeRunStatus::Completed | NodeRunStatus::Failed)
    }
}

/// Aggregated node counts for one execution snapshot
#[derive(Debug, Clone, Default, Serialize)]
pub struct NodeStats {
    pub total: i64,
    pub completed: i64,
    pub running: i64,
    pub pending: i64,
    pub failed: i64,
}

impl NodeStats {
    pub fn active(&self) -> bool {
        self.pending > 0 || self.running > 0
    }
}

/// Listing view of an execution, served to polling clients
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionSummary {
    pub id: String,
    pub scenario_id: String,
    pub status: String,
    pub progress: f64,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub node_stats: NodeStats,
}

/// One node row within an execution
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionNodeRun {
    pub node_id: String,
    pub status: NodeRunStatus,
    pub error: Option<String>,
    pub started_at: Option<i64>,
    pub finished_at: Option<i64>,
}

/// Full execution snapshot with per-node rows
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionDetails {
    #[serde(flatten)]
    pub summary: ExecutionSummary,
    pub trigger: Value,
    pub nodes: Vec<ExecutionNodeRun>,
}

/// Tracker over execution records
#[derive(Debug, Clone)]
pub struct ExecutionTracker {
    store: ScenarioStore,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn summary_from_row(row: &SqliteRow, node_stats: NodeStats) -> ExecutionSummary {
    ExecutionSummary {
        id: row.get("id"),
        scenario_id: row.get("scenario_id"),
        status: row.get("status"),
        progress: row.get("progress"),
        started_at: row.get("started_at"),
        finished_at: row.get("finished_at"),
        node_stats,
    }
}

impl ExecutionTracker {
    pub fn new(store: ScenarioStore) -> Self {
        Self { store }
    }

    /// Initialize the execution schema
    pub async fn init_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scenario_executions (
                id TEXT PRIMARY KEY,
                scenario_id TEXT NOT NULL,
                trigger_info TEXT NOT NULL,
                status TEXT NOT NULL,
                progress REAL NOT NULL DEFAULT 0,
                started_at INTEGER NOT NULL,
                finished_at INTEGER
            )
            "#,
        )
        .execute(self.store.pool())
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_executions_scenario
            ON scenario_executions(scenario_id, started_at)
            "#,
        )
        .execute(self.store.pool())
        .await?;

        // Partial index so the sub-2s active poll never scans finished rows
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_executions_active
            ON scenario_executions(started_at) WHERE finished_at IS NULL
            "#,
        )
        .execute(self.store.pool())
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS execution_nodes (
                execution_id TEXT NOT NULL,
                node_id TEXT NOT NULL,
                status TEXT NOT NULL,
                error TEXT,
                started_at INTEGER,
                finished_at INTEGER,
                PRIMARY KEY (execution_id, node_id)
            )
            "#,
        )
        .execute(self.store.pool())
        .await?;

        Ok(())
    }

    /// Start a new execution, seeding one pending row per scenario node
    ///
    /// Concurrent triggers each get an independent execution record; the
    /// tracker never deduplicates.
    pub async fn start_execution(&self, scenario_id: &str, trigger: Value) -> StoreResult<String> {
        let scenario = self.store.get_scenario(scenario_id).await?;
        // Only runnable scenarios start; paused/errored ones sit until the
        // owner flips them back
        if scenario.status != "active" && scenario.status != "draft" {
            return Err(StoreError::invalid(format!(
                "Scenario with status '{}' cannot be executed",
                scenario.status
            )));
        }
        let nodes = self.store.list_nodes(scenario_id).await?;
        if nodes.is_empty() {
            return Err(StoreError::invalid("Scenario has no nodes to execute"));
        }

        let execution_id = Uuid::new_v4().to_string();
        let now = now_ms();

        let mut tx = self.store.pool().begin().await?;
        sqlx::query(
            r#"
            INSERT INTO scenario_executions
                (id, scenario_id, trigger_info, status, progress, started_at)
            VALUES (?, ?, ?, 'running', 0, ?)
            "#,
        )
        .bind(&execution_id)
        .bind(scenario_id)
        .bind(trigger.to_string())
        .bind(now)
        .execute(&mut *tx)
        .await?;

        for node in &nodes {
            sqlx::query(
                r#"
                INSERT INTO execution_nodes (execution_id, node_id, status)
                VALUES (?, ?, 'pending')
                "#,
            )
            .bind(&execution_id)
            .bind(&node.id)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        tracing::info!(execution_id = %execution_id, scenario_id, total = nodes.len(),
            "started scenario execution");
        Ok(execution_id)
    }

    pub async fn mark_node_running(&self, execution_id: &str, node_id: &str) -> StoreResult<()> {
        self.transition(execution_id, node_id, NodeRunStatus::Running, None)
            .await
    }

    pub async fn mark_node_completed(&self, execution_id: &str, node_id: &str) -> StoreResult<()> {
        self.transition(execution_id, node_id, NodeRunStatus::Completed, None)
            .await
    }

    pub async fn mark_node_failed(
        &self,
        execution_id: &str,
        node_id: &str,
        error: &str,
    ) -> StoreResult<()> {
        self.transition(execution_id, node_id, NodeRunStatus::Failed, Some(error))
            .await
    }

    /// Force every non-terminal node of an execution to failed
    ///
    /// Used when the walk itself cannot proceed (e.g. the graph has a cycle)
    /// so the execution still reaches a terminal snapshot.
    pub async fn fail_remaining(&self, execution_id: &str, error: &str) -> StoreResult<()> {
        let mut tx = self.store.pool().begin().await?;
        sqlx::query(
            r#"
            UPDATE execution_nodes SET status = 'failed', error = ?, finished_at = ?
            WHERE execution_id = ? AND status IN ('pending', 'running')
            "#,
        )
        .bind(error)
        .bind(now_ms())
        .bind(execution_id)
        .execute(&mut *tx)
        .await?;
        self.recompute(&mut tx, execution_id).await?;
        tx.commit().await?;
        Ok(())
    }

    async fn transition(
        &self,
        execution_id: &str,
        node_id: &str,
        to: NodeRunStatus,
        error: Option<&str>,
    ) -> StoreResult<()> {
        let mut tx = self.store.pool().begin().await?;

        let row = sqlx::query(
            "SELECT status FROM execution_nodes WHERE execution_id = ? AND node_id = ?",
        )
        .bind(execution_id)
        .bind(node_id)
        .fetch_optional(&mut *tx)
        .await?;
        let current = match row {
            Some(r) => NodeRunStatus::parse(r.get("status")),
            None => {
                return Err(StoreError::not_found(format!(
                    "Node {node_id} is not part of execution {execution_id}"
                )))
            }
        };

        // Terminal states are sticky; running can only follow pending
        let valid = match to {
            NodeRunStatus::Running => current == NodeRunStatus::Pending,
            NodeRunStatus::Completed | NodeRunStatus::Failed => !current.is_terminal(),
            NodeRunStatus::Pending => false,
        };
        if !valid {
            return Err(StoreError::invalid(format!(
                "Cannot transition node from '{}' to '{}'",
                current.as_str(),
                to.as_str()
            )));
        }

        let now = now_ms();
        match to {
            NodeRunStatus::Running => {
                sqlx::query(
                    r#"
                    UPDATE execution_nodes SET status = 'running', started_at = ?
                    WHERE execution_id = ? AND node_id = ?
                    "#,
                )
                .bind(now)
                .bind(execution_id)
                .bind(node_id)
                .execute(&mut *tx)
                .await?;
            }
            _ => {
                sqlx::query(
                    r#"
                    UPDATE execution_nodes SET status = ?, error = ?, finished_at = ?
                    WHERE execution_id = ? AND node_id = ?
                    "#,
                )
                .bind(to.as_str())
                .bind(error)
                .bind(now)
                .bind(execution_id)
                .bind(node_id)
                .execute(&mut *tx)
                .await?;
            }
        }

        self.recompute(&mut tx, execution_id).await?;
        tx.commit().await?;
        Ok(())
    }

    /// Recompute progress from node counts and finalize once nothing is
    /// pending or running. Runs inside the transition's transaction.
    async fn recompute(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        execution_id: &str,
    ) -> StoreResult<()> {
        let stats = Self::node_stats(&mut *tx, execution_id).await?;
        let progress = if stats.total == 0 {
            0.0
        } else {
            ((stats.completed + stats.failed) as f64 / stats.total as f64) * 100.0
        };

        if stats.active() {
            sqlx::query("UPDATE scenario_executions SET progress = ? WHERE id = ?")
                .bind(progress)
                .bind(execution_id)
                .execute(&mut **tx)
                .await?;
            return Ok(());
        }

        let outcome = if stats.failed > 0 { "failed" } else { "completed" };
        let now = now_ms();
        sqlx::query(
            r#"
            UPDATE scenario_executions SET progress = ?, status = ?, finished_at = ?
            WHERE id = ? AND finished_at IS NULL
            "#,
        )
        .bind(progress)
        .bind(outcome)
        .bind(now)
        .bind(execution_id)
        .execute(&mut **tx)
        .await?;

        // Stamp the outcome onto the owning scenario
        let row = sqlx::query("SELECT scenario_id FROM scenario_executions WHERE id = ?")
            .bind(execution_id)
            .fetch_optional(&mut **tx)
            .await?;
        if let Some(row) = row {
            let scenario_id: String = row.get("scenario_id");
            sqlx::query(
                r#"
                UPDATE scenarios SET last_executed_at = ?, last_execution_result = ?
                WHERE id = ?
                "#,
            )
            .bind(now)
            .bind(outcome)
            .bind(&scenario_id)
            .execute(&mut **tx)
            .await?;

            // A failed run parks an active scenario in 'error' until the
            // owner re-activates it
            if outcome == "failed" {
                sqlx::query("UPDATE scenarios SET status = 'error' WHERE id = ? AND status = 'active'")
                    .bind(&scenario_id)
                    .execute(&mut **tx)
                    .await?;
            }

            tracing::info!(execution_id, scenario_id = %scenario_id, outcome,
                "execution reached terminal state");
        }
        Ok(())
    }

    async fn node_stats(
        conn: &mut SqliteConnection,
        execution_id: &str,
    ) -> StoreResult<NodeStats> {
        let rows = sqlx::query(
            r#"
            SELECT status, COUNT(*) AS cnt FROM execution_nodes
            WHERE execution_id = ? GROUP BY status
            "#,
        )
        .bind(execution_id)
        .fetch_all(conn)
        .await?;

        let mut stats = NodeStats::default();
        for row in rows {
            let status: String = row.get("status");
            let cnt: i64 = row.get("cnt");
            stats.total += cnt;
            match status.as_str() {
                "completed" => stats.completed = cnt,
                "running" => stats.running = cnt,
                "failed" => stats.failed = cnt,
                _ => stats.pending = cnt,
            }
        }
        Ok(stats)
    }

    /// Full snapshot of one execution
    pub async fn get_execution(&self, execution_id: &str) -> StoreResult<ExecutionDetails> {
        let row = sqlx::query("SELECT * FROM scenario_executions WHERE id = ?")
            .bind(execution_id)
            .fetch_optional(self.store.pool())
            .await?
            .ok_or_else(|| {
                StoreError::not_found(format!("Execution with ID {execution_id} not found"))
            })?;

        let mut conn = self.store.pool().acquire().await?;
        let stats = Self::node_stats(&mut conn, execution_id).await?;
        let trigger: Value =
            serde_json::from_str(row.get::<String, _>("trigger_info").as_str()).unwrap_or(Value::Null);

        // Reuse the held connection; a second pool acquire here would wait on
        // itself when the pool is capped at one connection
        let node_rows = sqlx::query(
            "SELECT * FROM execution_nodes WHERE execution_id = ? ORDER BY rowid ASC",
        )
        .bind(execution_id)
        .fetch_all(&mut *conn)
        .await?;
        let nodes = node_rows
            .iter()
            .map(|r| ExecutionNodeRun {
                node_id: r.get("node_id"),
                status: NodeRunStatus::parse(r.get("status")),
                error: r.get("error"),
                started_at: r.get("started_at"),
                finished_at: r.get("finished_at"),
            })
            .collect();

        Ok(ExecutionDetails {
            summary: summary_from_row(&row, stats),
            trigger,
            nodes,
        })
    }

    /// Executions that still have pending or running nodes, newest first
    pub async fn list_active_executions(&self, limit: i64) -> StoreResult<Vec<ExecutionSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM scenario_executions
            WHERE finished_at IS NULL
            ORDER BY started_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(self.store.pool())
        .await?;
        self.summaries(rows).await
    }

    /// Recent executions of one scenario, newest first
    pub async fn list_scenario_executions(
        &self,
        scenario_id: &str,
        limit: i64,
    ) -> StoreResult<Vec<ExecutionSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM scenario_executions
            WHERE scenario_id = ?
            ORDER BY started_at DESC
            LIMIT ?
            "#,
        )
        .bind(scenario_id)
        .bind(limit)
        .fetch_all(self.store.pool())
        .await?;
        self.summaries(rows).await
    }

    async fn summaries(&self, rows: Vec<SqliteRow>) -> StoreResult<Vec<ExecutionSummary>> {
        let mut conn = self.store.pool().acquire().await?;
        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let id: String = row.get("id");
            let stats = Self::node_stats(&mut conn, &id).await?;
            summaries.push(summary_from_row(row, stats));
        }
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{NewConnection, NewNode, NewScenario};
    use crate::testutil::memory_store;
    use serde_json::json;

    async fn seed_linear_nodes(
        store: &ScenarioStore,
        scenario_id: &str,
        node_count: usize,
    ) -> Vec<String> {
        let mut node_ids = Vec::new();
        for i in 0..node_count {
            let node_type = if i == 0 { "trigger" } else { "action" };
            node_ids.push(
                store
                    .create_node(NewNode {
                        scenario_id: scenario_id.to_string(),
                        node_type: node_type.into(),
                        label: format!("n{i}"),
                        config: "{}".into(),
                        position: "{}".into(),
                        order: Some(i as i64),
                    })
                    .await
                    .unwrap(),
            );
        }
        for pair in node_ids.windows(2) {
            store
                .create_connection(NewConnection {
                    scenario_id: scenario_id.to_string(),
                    source_node_id: pair[0].clone(),
                    target_node_id: pair[1].clone(),
                    mapping: None,
                    label: None,
                })
                .await
                .unwrap();
        }
        node_ids
    }

    async fn seed_linear_scenario(store: &ScenarioStore, node_count: usize) -> (String, Vec<String>) {
        let scenario_id = store
            .create_scenario(NewScenario {
                name: "run me".into(),
                description: "".into(),
                owner_id: "u1".into(),
                status: Some("active".into()),
                schedule: None,
                scenario_type: None,
                slug: None,
            })
            .await
            .unwrap();
        let node_ids = seed_linear_nodes(store, &scenario_id, node_count).await;
        (scenario_id, node_ids)
    }

    async fn tracker_with_scenario(
        node_count: usize,
    ) -> (ExecutionTracker, String, Vec<String>) {
        let store = memory_store().await;
        let (scenario_id, node_ids) = seed_linear_scenario(&store, node_count).await;
        let tracker = ExecutionTracker::new(store);
        tracker.init_schema().await.unwrap();
        (tracker, scenario_id, node_ids)
    }

    fn assert_sums(stats: &NodeStats) {
        assert_eq!(
            stats.completed + stats.running + stats.pending + stats.failed,
            stats.total
        );
    }

    #[tokio::test]
    async fn start_seeds_one_pending_row_per_node() {
        let (tracker, scenario_id, node_ids) = tracker_with_scenario(5).await;
        let exec = tracker
            .start_execution(&scenario_id, json!({"kind": "manual"}))
            .await
            .unwrap();

        let details = tracker.get_execution(&exec).await.unwrap();
        assert_eq!(details.summary.node_stats.total, node_ids.len() as i64);
        assert_eq!(details.summary.node_stats.pending, node_ids.len() as i64);
        assert_eq!(details.summary.status, "running");
        assert_sums(&details.summary.node_stats);
    }

    #[tokio::test]
    async fn stats_sum_to_total_at_every_observation() {
        let (tracker, scenario_id, nodes) = tracker_with_scenario(5).await;
        let exec = tracker
            .start_execution(&scenario_id, json!({"kind": "manual"}))
            .await
            .unwrap();

        // Mixed snapshot: two complete, one fails, one runs
        tracker.mark_node_running(&exec, &nodes[0]).await.unwrap();
        tracker.mark_node_completed(&exec, &nodes[0]).await.unwrap();
        tracker.mark_node_running(&exec, &nodes[1]).await.unwrap();
        tracker.mark_node_completed(&exec, &nodes[1]).await.unwrap();
        tracker.mark_node_running(&exec, &nodes[2]).await.unwrap();
        tracker
            .mark_node_failed(&exec, &nodes[2], "boom")
            .await
            .unwrap();
        tracker.mark_node_running(&exec, &nodes[3]).await.unwrap();

        let details = tracker.get_execution(&exec).await.unwrap();
        let stats = &details.summary.node_stats;
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.running, 1);
        assert_eq!(stats.pending, 1);
        assert_sums(stats);

        // Still active, so still listed
        let active = tracker.list_active_executions(10).await.unwrap();
        assert!(active.iter().any(|e| e.id == exec));
    }

    #[tokio::test]
    async fn progress_is_monotonic_and_execution_finalizes() {
        let (tracker, scenario_id, nodes) = tracker_with_scenario(3).await;
        let exec = tracker
            .start_execution(&scenario_id, json!({"kind": "manual"}))
            .await
            .unwrap();

        let mut last_progress = 0.0;
        for (i, node) in nodes.iter().enumerate() {
            tracker.mark_node_running(&exec, node).await.unwrap();
            if i == 1 {
                tracker.mark_node_failed(&exec, node, "nope").await.unwrap();
            } else {
                tracker.mark_node_completed(&exec, node).await.unwrap();
            }
            let details = tracker.get_execution(&exec).await.unwrap();
            assert!(details.summary.progress >= last_progress);
            last_progress = details.summary.progress;
        }

        let details = tracker.get_execution(&exec).await.unwrap();
        assert_eq!(details.summary.progress, 100.0);
        assert_eq!(details.summary.status, "failed");
        assert!(details.summary.finished_at.is_some());

        // Terminal executions drop out of the active listing
        let active = tracker.list_active_executions(10).await.unwrap();
        assert!(active.iter().all(|e| e.id != exec));
    }

    #[tokio::test]
    async fn terminal_node_states_are_sticky() {
        let (tracker, scenario_id, nodes) = tracker_with_scenario(2).await;
        let exec = tracker
            .start_execution(&scenario_id, json!({"kind": "manual"}))
            .await
            .unwrap();

        tracker.mark_node_running(&exec, &nodes[0]).await.unwrap();
        tracker.mark_node_completed(&exec, &nodes[0]).await.unwrap();

        let err = tracker
            .mark_node_running(&exec, &nodes[0])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
        let err = tracker
            .mark_node_failed(&exec, &nodes[0], "late")
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn concurrent_triggers_get_independent_executions() {
        let (tracker, scenario_id, _) = tracker_with_scenario(2).await;
        let a = tracker
            .start_execution(&scenario_id, json!({"kind": "webhook"}))
            .await
            .unwrap();
        let b = tracker
            .start_execution(&scenario_id, json!({"kind": "webhook"}))
            .await
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(tracker.list_active_executions(10).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn empty_scenario_cannot_start() {
        let store = memory_store().await;
        let scenario_id = store
            .create_scenario(NewScenario {
                name: "empty".into(),
                description: "".into(),
                owner_id: "u1".into(),
                status: None,
                schedule: None,
                scenario_type: None,
                slug: None,
            })
            .await
            .unwrap();
        let tracker = ExecutionTracker::new(store);
        tracker.init_schema().await.unwrap();

        let err = tracker
            .start_execution(&scenario_id, json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn non_runnable_scenario_cannot_start() {
        let store = memory_store().await;
        let scenario_id = store
            .create_scenario(NewScenario {
                name: "paused".into(),
                description: "".into(),
                owner_id: "u1".into(),
                status: Some("paused".into()),
                schedule: None,
                scenario_type: None,
                slug: None,
            })
            .await
            .unwrap();
        seed_linear_nodes(&store, &scenario_id, 2).await;
        let tracker = ExecutionTracker::new(store);
        tracker.init_schema().await.unwrap();

        let err = tracker
            .start_execution(&scenario_id, json!({"kind": "manual"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn failed_run_parks_active_scenario_in_error() {
        let (tracker, scenario_id, nodes) = tracker_with_scenario(2).await;
        let exec = tracker
            .start_execution(&scenario_id, json!({"kind": "manual"}))
            .await
            .unwrap();

        tracker.mark_node_running(&exec, &nodes[0]).await.unwrap();
        tracker.mark_node_failed(&exec, &nodes[0], "boom").await.unwrap();
        tracker.mark_node_completed(&exec, &nodes[1]).await.unwrap();

        let scenario = tracker.store.get_scenario(&scenario_id).await.unwrap();
        assert_eq!(scenario.status, "error");
        assert_eq!(scenario.last_execution_result.as_deref(), Some("failed"));

        // Parked scenarios refuse new runs until re-activated
        let err = tracker
            .start_execution(&scenario_id, json!({"kind": "webhook"}))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));

        tracker
            .store
            .update_scenario(
                &scenario_id,
                crate::scenario::ScenarioPatch {
                    status: Some("active".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(tracker
            .start_execution(&scenario_id, json!({"kind": "webhook"}))
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn fail_remaining_terminates_the_execution() {
        let (tracker, scenario_id, nodes) = tracker_with_scenario(3).await;
        let exec = tracker
            .start_execution(&scenario_id, json!({"kind": "manual"}))
            .await
            .unwrap();
        tracker.mark_node_running(&exec, &nodes[0]).await.unwrap();

        tracker.fail_remaining(&exec, "cycle detected").await.unwrap();

        let details = tracker.get_execution(&exec).await.unwrap();
        assert_eq!(details.summary.status, "failed");
        assert_eq!(details.summary.node_stats.failed, 3);
        assert_sums(&details.summary.node_stats);
    }
}
