/// Execution layer
///
/// Tracks scenario runs (per-node state machine, progress aggregation,
/// active-execution listing) and drives walks over the scenario DAG through
/// the `ActionInvoker` seam.

// Execution records and progress aggregation
pub mod tracker;

// DAG walk driving tracker transitions
pub mod runner;

// Re-export main types
pub use runner::{AckInvoker, ActionInvoker, ExecutionRunner};
pub use tracker::{ExecutionDetails, ExecutionSummary, ExecutionTracker, NodeRunStatus, NodeStats};
