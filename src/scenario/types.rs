/// Core scenario graph type definitions
///
/// Defines scenarios, nodes, and directed node connections as stored in
/// SQLite. Node config, position, and connection mapping are opaque
/// serialized strings (typically JSON) so new integration node types need no
/// schema migration.

use serde::{Deserialize, Serialize};

/// Classification of a scenario.
///
/// `Checkout` scenarios are addressable flows: they require a globally unique
/// slug and are seeded with the two system nodes at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScenarioType {
    General,
    Checkout,
}

impl ScenarioType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScenarioType::General => "general",
            ScenarioType::Checkout => "checkout",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "checkout" => ScenarioType::Checkout,
            _ => ScenarioType::General,
        }
    }
}

/// A named workflow owned by a user
///
/// Slug and scenario type are fixed at creation; only name, description,
/// status, and schedule are mutable afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Lifecycle status (e.g., "draft", "active", "error")
    pub status: String,
    /// Optional cron-like schedule string
    pub schedule: Option<String>,
    pub scenario_type: ScenarioType,
    /// Unique addressable slug; required for checkout scenarios
    pub slug: Option<String>,
    pub owner_id: String,
    /// Last execution outcome, patched by the execution tracker
    pub last_executed_at: Option<i64>,
    pub last_execution_result: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a scenario
#[derive(Debug, Clone, Deserialize)]
pub struct NewScenario {
    pub name: String,
    pub description: String,
    pub owner_id: String,
    pub status: Option<String>,
    pub schedule: Option<String>,
    pub scenario_type: Option<ScenarioType>,
    pub slug: Option<String>,
}

/// Partial update of a scenario; only these four fields are mutable
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScenarioPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
    pub schedule: Option<String>,
}

/// A step within a scenario
///
/// `node_type` is a free-form tag ("trigger", "action", "checkout", ...).
/// Webhook and polling trigger state lives directly on the node row so that
/// token regeneration is a single atomic update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub scenario_id: String,
    pub node_type: String,
    pub label: String,
    /// Opaque serialized config, typically JSON
    pub config: String,
    /// Opaque serialized position, typically `{"x":..,"y":..}`
    pub position: String,
    pub order: Option<i64>,
    /// Seeded system nodes are not individually deletable
    pub is_system: bool,
    /// Current webhook token; regenerating replaces it and revokes the old one
    pub webhook_token: Option<String>,
    pub webhook_enabled: bool,
    pub polling_enabled: bool,
    pub polling_interval_minutes: Option<i64>,
    pub last_polled_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Node type tag for trigger nodes; only these accept webhook/polling config.
pub const NODE_TYPE_TRIGGER: &str = "trigger";

/// Input for creating a node
#[derive(Debug, Clone, Deserialize)]
pub struct NewNode {
    pub scenario_id: String,
    pub node_type: String,
    pub label: String,
    pub config: String,
    pub position: String,
    pub order: Option<i64>,
}

/// Partial update of a node
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodePatch {
    pub label: Option<String>,
    pub config: Option<String>,
    pub position: Option<String>,
    pub order: Option<i64>,
}

/// A directed edge between two nodes of the same scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConnection {
    pub id: String,
    pub scenario_id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    /// Opaque field-mapping expression
    pub mapping: Option<String>,
    pub label: Option<String>,
    pub order: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Input for creating a connection
#[derive(Debug, Clone, Deserialize)]
pub struct NewConnection {
    pub scenario_id: String,
    pub source_node_id: String,
    pub target_node_id: String,
    pub mapping: Option<String>,
    pub label: Option<String>,
}

/// Minimal identity record used for ownership checks
///
/// Identity resolution itself is external; this is just the stable id the
/// provider hands back, registered so scenario ownership can be verified.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub created_at: i64,
}
