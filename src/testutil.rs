//! Shared fixtures for the in-crate test suites

use crate::scenario::{NewNode, NewScenario, ScenarioStore, NODE_TYPE_TRIGGER};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Fresh in-memory store with the schema applied and user `u1` registered.
///
/// Capped at a single connection: every `:memory:` connection is its own
/// database, so a second pooled connection would see empty tables.
pub async fn memory_store() -> ScenarioStore {
    let options = SqliteConnectOptions::new()
        .in_memory(true)
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory sqlite pool");
    let store = ScenarioStore::new(pool);
    store.init_schema().await.expect("schema");
    store.register_user("u1", "Test User").await.expect("seed user");
    store
}

/// One general scenario owned by `u1` holding a single trigger node.
pub async fn seed_trigger_node(store: &ScenarioStore) -> (String, String) {
    let scenario_id = store
        .create_scenario(NewScenario {
            name: "Poll things".into(),
            description: "".into(),
            owner_id: "u1".into(),
            status: Some("active".into()),
            schedule: None,
            scenario_type: None,
            slug: None,
        })
        .await
        .expect("scenario");
    let node_id = store
        .create_node(NewNode {
            scenario_id: scenario_id.clone(),
            node_type: NODE_TYPE_TRIGGER.into(),
            label: "Incoming".into(),
            config: "{}".into(),
            position: "{}".into(),
            order: None,
        })
        .await
        .expect("trigger node");
    (scenario_id, node_id)
}
