/// Scenario graph layer
///
/// Holds the graph definition store: type definitions, SQLite persistence
/// with write-time referential integrity, and the lock-free hot-reload
/// registry of compiled scenarios.

// Core scenario/node/connection type definitions
pub mod types;

// SQLite persistence with transactional seeding and cascades
pub mod store;

// Hot-reload registry using ArcSwap
pub mod registry;

// Re-export commonly used types
pub use registry::{CompiledScenario, ScenarioRegistry};
pub use store::ScenarioStore;
pub use types::{
    NewConnection, NewNode, NewScenario, Node, NodeConnection, NodePatch, Scenario, ScenarioPatch,
    ScenarioType, User, NODE_TYPE_TRIGGER,
};
