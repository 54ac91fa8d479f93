/// SQLite persistence layer for the scenario graph
///
/// Durable CRUD for scenarios, nodes, and connections with referential
/// integrity enforced at write time. Uniqueness (scenario slug, ordered
/// edge pairs) is backed by real unique indexes rather than read-then-write,
/// endpoint existence by foreign keys (pools must connect with
/// `foreign_keys(true)`), and multi-document operations (checkout seeding,
/// cascade deletes) run inside transactions so a crash cannot leave orphaned
/// documents.

use crate::error::{StoreError, StoreResult};
use crate::scenario::types::{
    NewConnection, NewNode, NewScenario, Node, NodeConnection, NodePatch, Scenario, ScenarioPatch,
    ScenarioType, User,
};
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

/// SQLite-based store for the scenario graph
#[derive(Debug, Clone)]
pub struct ScenarioStore {
    pool: SqlitePool,
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

fn scenario_from_row(row: &SqliteRow) -> Scenario {
    Scenario {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        status: row.get("status"),
        schedule: row.get("schedule"),
        scenario_type: ScenarioType::parse(row.get("scenario_type")),
        slug: row.get("slug"),
        owner_id: row.get("owner_id"),
        last_executed_at: row.get("last_executed_at"),
        last_execution_result: row.get("last_execution_result"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn node_from_row(row: &SqliteRow) -> Node {
    Node {
        id: row.get("id"),
        scenario_id: row.get("scenario_id"),
        node_type: row.get("node_type"),
        label: row.get("label"),
        config: row.get("config"),
        position: row.get("position"),
        order: row.get("ord"),
        is_system: row.get("is_system"),
        webhook_token: row.get("webhook_token"),
        webhook_enabled: row.get("webhook_enabled"),
        polling_enabled: row.get("polling_enabled"),
        polling_interval_minutes: row.get("polling_interval_minutes"),
        last_polled_at: row.get("last_polled_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn connection_from_row(row: &SqliteRow) -> NodeConnection {
    NodeConnection {
        id: row.get("id"),
        scenario_id: row.get("scenario_id"),
        source_node_id: row.get("source_node_id"),
        target_node_id: row.get("target_node_id"),
        mapping: row.get("mapping"),
        label: row.get("label"),
        order: row.get("ord"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

impl ScenarioStore {
    /// Create a new store instance over an existing connection pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// The underlying pool, shared with the trigger dispatcher and tracker
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the scenario graph schema
    ///
    /// Safe to call multiple times (uses IF NOT EXISTS).
    pub async fn init_schema(&self) -> StoreResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS scenarios (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                status TEXT NOT NULL,
                schedule TEXT,
                scenario_type TEXT NOT NULL,
                slug TEXT,
                owner_id TEXT NOT NULL,
                last_executed_at INTEGER,
                last_execution_result TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (owner_id) REFERENCES users(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Global slug uniqueness, race-free under concurrent creation
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_scenarios_slug
            ON scenarios(slug) WHERE slug IS NOT NULL
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_scenarios_owner ON scenarios(owner_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS nodes (
                id TEXT PRIMARY KEY,
                scenario_id TEXT NOT NULL,
                node_type TEXT NOT NULL,
                label TEXT NOT NULL,
                config TEXT NOT NULL,
                position TEXT NOT NULL,
                ord INTEGER,
                is_system INTEGER NOT NULL DEFAULT 0,
                webhook_token TEXT,
                webhook_enabled INTEGER NOT NULL DEFAULT 0,
                polling_enabled INTEGER NOT NULL DEFAULT 0,
                polling_interval_minutes INTEGER,
                last_polled_at INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (scenario_id) REFERENCES scenarios(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_nodes_scenario ON nodes(scenario_id)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS node_connections (
                id TEXT PRIMARY KEY,
                scenario_id TEXT NOT NULL,
                source_node_id TEXT NOT NULL,
                target_node_id TEXT NOT NULL,
                mapping TEXT,
                label TEXT,
                ord INTEGER,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                FOREIGN KEY (scenario_id) REFERENCES scenarios(id),
                FOREIGN KEY (source_node_id) REFERENCES nodes(id),
                FOREIGN KEY (target_node_id) REFERENCES nodes(id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // At most one connection per ordered (source, target) pair
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_connections_pair
            ON node_connections(source_node_id, target_node_id)
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_connections_scenario ON node_connections(scenario_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_connections_source ON node_connections(source_node_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_connections_target ON node_connections(target_node_id)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // ---- users ----

    /// Register (or refresh) an identity record for ownership checks
    pub async fn register_user(&self, id: &str, name: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(now_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_user(&self, id: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT id, name, created_at FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| User {
            id: r.get("id"),
            name: r.get("name"),
            created_at: r.get("created_at"),
        }))
    }

    /// Every registered user id, used to warm the registry at startup
    pub async fn list_owner_ids(&self) -> StoreResult<Vec<String>> {
        let rows = sqlx::query("SELECT id FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(|r| r.get("id")).collect())
    }

    // ---- scenarios ----

    /// Create a scenario; checkout scenarios are seeded with their two system
    /// nodes and connecting edge in the same transaction.
    pub async fn create_scenario(&self, new: NewScenario) -> StoreResult<String> {
        let owner = sqlx::query("SELECT id FROM users WHERE id = ?")
            .bind(&new.owner_id)
            .fetch_optional(&self.pool)
            .await?;
        if owner.is_none() {
            return Err(StoreError::not_found(format!(
                "User with ID {} not found",
                new.owner_id
            )));
        }

        let scenario_type = new.scenario_type.unwrap_or(ScenarioType::General);
        let slug = match scenario_type {
            ScenarioType::Checkout => {
                let slug = new.slug.as_deref().unwrap_or("").trim().to_string();
                if slug.is_empty() {
                    return Err(StoreError::invalid(
                        "Slug is required for checkout scenarios",
                    ));
                }
                Some(slug)
            }
            ScenarioType::General => new
                .slug
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        };

        let scenario_id = Uuid::new_v4().to_string();
        let now = now_ms();

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO scenarios
                (id, name, description, status, schedule, scenario_type, slug,
                 owner_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&scenario_id)
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.status.as_deref().unwrap_or("draft"))
        .bind(&new.schedule)
        .bind(scenario_type.as_str())
        .bind(&slug)
        .bind(&new.owner_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await;

        if let Err(e) = inserted {
            // Rolls back implicitly when the transaction drops
            if StoreError::is_unique_violation(&e) {
                return Err(StoreError::conflict(
                    "A scenario with this slug already exists",
                ));
            }
            return Err(e.into());
        }

        if scenario_type == ScenarioType::Checkout {
            let checkout_node_id = Uuid::new_v4().to_string();
            let confirmation_node_id = Uuid::new_v4().to_string();

            sqlx::query(
                r#"
                INSERT INTO nodes
                    (id, scenario_id, node_type, label, config, position, ord,
                     is_system, created_at, updated_at)
                VALUES (?, ?, 'checkout', 'Checkout', '{}', ?, 1, 1, ?, ?)
                "#,
            )
            .bind(&checkout_node_id)
            .bind(&scenario_id)
            .bind(r#"{"x":100,"y":100}"#)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO nodes
                    (id, scenario_id, node_type, label, config, position, ord,
                     is_system, created_at, updated_at)
                VALUES (?, ?, 'order_confirmation', 'Order Confirmation', '{}', ?, 2, 1, ?, ?)
                "#,
            )
            .bind(&confirmation_node_id)
            .bind(&scenario_id)
            .bind(r#"{"x":400,"y":100}"#)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO node_connections
                    (id, scenario_id, source_node_id, target_node_id, mapping,
                     label, ord, created_at, updated_at)
                VALUES (?, ?, ?, ?, NULL, 'to_confirmation', 1, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&scenario_id)
            .bind(&checkout_node_id)
            .bind(&confirmation_node_id)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        tracing::info!(scenario_id = %scenario_id, scenario_type = scenario_type.as_str(),
            "created scenario '{}'", new.name);

        Ok(scenario_id)
    }

    /// Patch a scenario; slug and scenario type are immutable post-creation
    pub async fn update_scenario(&self, id: &str, patch: ScenarioPatch) -> StoreResult<String> {
        let result = sqlx::query(
            r#"
            UPDATE scenarios SET
                name = COALESCE(?, name),
                description = COALESCE(?, description),
                status = COALESCE(?, status),
                schedule = COALESCE(?, schedule),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&patch.name)
        .bind(&patch.description)
        .bind(&patch.status)
        .bind(&patch.schedule)
        .bind(now_ms())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!(
                "Scenario with ID {id} not found"
            )));
        }
        Ok(id.to_string())
    }

    /// Delete a scenario and everything it owns: connections first, then
    /// nodes, then the scenario record, all in one transaction.
    pub async fn delete_scenario(&self, id: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let existing = sqlx::query("SELECT id FROM scenarios WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if existing.is_none() {
            return Err(StoreError::not_found(format!(
                "Scenario with ID {id} not found"
            )));
        }

        sqlx::query("DELETE FROM node_connections WHERE scenario_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM nodes WHERE scenario_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM scenarios WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(scenario_id = %id, "deleted scenario with its nodes and connections");
        Ok(())
    }

    pub async fn get_scenario(&self, id: &str) -> StoreResult<Scenario> {
        let row = sqlx::query("SELECT * FROM scenarios WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| scenario_from_row(&r)).ok_or_else(|| {
            StoreError::not_found(format!("Scenario with ID {id} not found"))
        })
    }

    pub async fn get_scenario_by_slug(&self, slug: &str) -> StoreResult<Option<Scenario>> {
        let row = sqlx::query("SELECT * FROM scenarios WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| scenario_from_row(&r)))
    }

    pub async fn list_scenarios(&self, owner_id: &str) -> StoreResult<Vec<Scenario>> {
        let rows = sqlx::query(
            "SELECT * FROM scenarios WHERE owner_id = ? ORDER BY updated_at DESC",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(scenario_from_row).collect())
    }

    // ---- nodes ----

    pub async fn create_node(&self, new: NewNode) -> StoreResult<String> {
        let scenario = sqlx::query("SELECT id FROM scenarios WHERE id = ?")
            .bind(&new.scenario_id)
            .fetch_optional(&self.pool)
            .await?;
        if scenario.is_none() {
            return Err(StoreError::not_found(format!(
                "Scenario with ID {} not found",
                new.scenario_id
            )));
        }

        let node_id = Uuid::new_v4().to_string();
        let now = now_ms();
        let inserted = sqlx::query(
            r#"
            INSERT INTO nodes
                (id, scenario_id, node_type, label, config, position, ord,
                 is_system, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&node_id)
        .bind(&new.scenario_id)
        .bind(&new.node_type)
        .bind(&new.label)
        .bind(&new.config)
        .bind(&new.position)
        .bind(new.order)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(node_id),
            // Scenario deleted between the check above and the insert
            Err(e) if StoreError::is_foreign_key_violation(&e) => Err(StoreError::not_found(
                format!("Scenario with ID {} not found", new.scenario_id),
            )),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn update_node(&self, id: &str, patch: NodePatch) -> StoreResult<String> {
        let result = sqlx::query(
            r#"
            UPDATE nodes SET
                label = COALESCE(?, label),
                config = COALESCE(?, config),
                position = COALESCE(?, position),
                ord = COALESCE(?, ord),
                updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&patch.label)
        .bind(&patch.config)
        .bind(&patch.position)
        .bind(patch.order)
        .bind(now_ms())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!("Node with ID {id} not found")));
        }
        Ok(id.to_string())
    }

    /// Delete a node, cascading to every connection that touches it.
    /// System nodes only go away with their owning scenario.
    pub async fn delete_node(&self, id: &str) -> StoreResult<()> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query("SELECT is_system FROM nodes WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let is_system: bool = match row {
            Some(r) => r.get("is_system"),
            None => {
                return Err(StoreError::not_found(format!(
                    "Node with ID {id} not found"
                )))
            }
        };
        if is_system {
            return Err(StoreError::invalid("System nodes cannot be deleted"));
        }

        sqlx::query(
            "DELETE FROM node_connections WHERE source_node_id = ? OR target_node_id = ?",
        )
        .bind(id)
        .bind(id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("DELETE FROM nodes WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get_node(&self, id: &str) -> StoreResult<Node> {
        let row = sqlx::query("SELECT * FROM nodes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| node_from_row(&r))
            .ok_or_else(|| StoreError::not_found(format!("Node with ID {id} not found")))
    }

    pub async fn list_nodes(&self, scenario_id: &str) -> StoreResult<Vec<Node>> {
        let rows = sqlx::query(
            "SELECT * FROM nodes WHERE scenario_id = ? ORDER BY ord ASC, created_at ASC",
        )
        .bind(scenario_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(node_from_row).collect())
    }

    // ---- connections ----

    /// Create a directed edge; both endpoints must exist and belong to the
    /// declared scenario, and the ordered pair must be unique.
    pub async fn create_connection(&self, new: NewConnection) -> StoreResult<String> {
        let scenario = sqlx::query("SELECT id FROM scenarios WHERE id = ?")
            .bind(&new.scenario_id)
            .fetch_optional(&self.pool)
            .await?;
        if scenario.is_none() {
            return Err(StoreError::not_found(format!(
                "Scenario with ID {} not found",
                new.scenario_id
            )));
        }

        let source = match self.get_node(&new.source_node_id).await {
            Ok(node) => node,
            Err(StoreError::NotFound(_)) => {
                return Err(StoreError::not_found(format!(
                    "Source node with ID {} not found",
                    new.source_node_id
                )))
            }
            Err(e) => return Err(e),
        };
        let target = match self.get_node(&new.target_node_id).await {
            Ok(node) => node,
            Err(StoreError::NotFound(_)) => {
                return Err(StoreError::not_found(format!(
                    "Target node with ID {} not found",
                    new.target_node_id
                )))
            }
            Err(e) => return Err(e),
        };

        if source.scenario_id != new.scenario_id || target.scenario_id != new.scenario_id {
            return Err(StoreError::invalid(
                "Source and target nodes must belong to the declared scenario",
            ));
        }
        if new.source_node_id == new.target_node_id {
            return Err(StoreError::invalid(
                "A node cannot be connected to itself",
            ));
        }

        let connection_id = Uuid::new_v4().to_string();
        let now = now_ms();
        let inserted = sqlx::query(
            r#"
            INSERT INTO node_connections
                (id, scenario_id, source_node_id, target_node_id, mapping,
                 label, ord, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?)
            "#,
        )
        .bind(&connection_id)
        .bind(&new.scenario_id)
        .bind(&new.source_node_id)
        .bind(&new.target_node_id)
        .bind(&new.mapping)
        .bind(&new.label)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await;

        match inserted {
            Ok(_) => Ok(connection_id),
            Err(e) if StoreError::is_unique_violation(&e) => Err(StoreError::conflict(
                "A connection between these nodes already exists",
            )),
            // An endpoint was deleted between the checks above and the
            // insert; the foreign keys reject the dangling edge
            Err(e) if StoreError::is_foreign_key_violation(&e) => Err(StoreError::not_found(
                "Source or target node no longer exists",
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Replace the mapping expression of a connection (None clears it)
    pub async fn update_connection(
        &self,
        id: &str,
        mapping: Option<String>,
    ) -> StoreResult<String> {
        let result = sqlx::query(
            "UPDATE node_connections SET mapping = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&mapping)
        .bind(now_ms())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!(
                "Connection with ID {id} not found"
            )));
        }
        Ok(id.to_string())
    }

    pub async fn delete_connection(&self, id: &str) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM node_connections WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(format!(
                "Connection with ID {id} not found"
            )));
        }
        Ok(())
    }

    pub async fn get_connection(&self, id: &str) -> StoreResult<NodeConnection> {
        let row = sqlx::query("SELECT * FROM node_connections WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(|r| connection_from_row(&r)).ok_or_else(|| {
            StoreError::not_found(format!("Connection with ID {id} not found"))
        })
    }

    pub async fn list_connections(&self, scenario_id: &str) -> StoreResult<Vec<NodeConnection>> {
        let rows = sqlx::query(
            "SELECT * FROM node_connections WHERE scenario_id = ? ORDER BY created_at ASC",
        )
        .bind(scenario_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(connection_from_row).collect())
    }

    /// Connections touching a node in either direction
    pub async fn connections_for_node(&self, node_id: &str) -> StoreResult<Vec<NodeConnection>> {
        let rows = sqlx::query(
            "SELECT * FROM node_connections WHERE source_node_id = ? OR target_node_id = ?",
        )
        .bind(node_id)
        .bind(node_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(connection_from_row).collect())
    }
}
