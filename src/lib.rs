/// scenariod: scenario automation engine
///
/// Scenarios are graphs of nodes joined by directed connections. Trigger
/// nodes fire via webhooks or polling, the runner walks the graph in
/// topological order, and the tracker records per-node progress that
/// dashboards poll while a run is in flight.

// Configuration from environment variables
pub mod config;

// Store error taxonomy shared by every layer
pub mod error;

// Scenario graph model, SQLite store, and hot-reload registry
pub mod scenario;

// Webhook and polling triggers plus the cron-driven poll sweep
pub mod trigger;

// Graph execution and per-node progress tracking
pub mod execution;

// HTTP API layer
pub mod api;

// Server setup and initialization
pub mod server;

#[cfg(test)]
mod testutil;

// Re-export commonly used types for external consumers
pub use error::{StoreError, StoreResult};
pub use execution::{ExecutionRunner, ExecutionTracker};
pub use scenario::{Node, NodeConnection, Scenario, ScenarioRegistry, ScenarioStore};
pub use server::start_server;
pub use trigger::TriggerDispatcher;
