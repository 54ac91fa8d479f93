/// Trigger dispatch layer
///
/// Manages how an external event starts a scenario run: webhook URL issuance
/// and verification, per-node polling configuration, and the background sweep
/// that fires due polling triggers.

// Webhook URL issuance, regeneration, and token verification
pub mod webhook;

// Polling configuration and due-trigger queries
pub mod polling;

// Background sweep driving polling triggers
pub mod scheduler;

use crate::scenario::ScenarioStore;

/// Dispatcher over trigger-node state
///
/// All operations are single-document reads/patches against the node row;
/// webhook token swaps are a single UPDATE, so at no point do two URLs
/// validate at once.
#[derive(Debug, Clone)]
pub struct TriggerDispatcher {
    store: ScenarioStore,
}

impl TriggerDispatcher {
    pub fn new(store: ScenarioStore) -> Self {
        Self { store }
    }

    pub(crate) fn store(&self) -> &ScenarioStore {
        &self.store
    }
}

pub use scheduler::PollScheduler;
