/// Hot-reload scenario registry using ArcSwap
///
/// Lock-free cache of compiled scenarios (graph documents plus extracted
/// trigger metadata). Mutations swap the whole map pointer, so webhook
/// dispatch and the poll sweep read without blocking concurrent executions.

use crate::error::StoreResult;
use crate::scenario::store::ScenarioStore;
use crate::scenario::types::{Node, NodeConnection, Scenario, NODE_TYPE_TRIGGER};
use arc_swap::ArcSwap;
use std::{collections::HashMap, sync::Arc};

/// A scenario with its full graph and extracted execution metadata
#[derive(Debug, Clone)]
pub struct CompiledScenario {
    pub scenario: Scenario,
    pub nodes: Vec<Node>,
    pub connections: Vec<NodeConnection>,
    /// Ids of trigger-type nodes, the entry points for webhook/polling starts
    pub trigger_node_ids: Vec<String>,
}

#[derive(Debug)]
pub struct ScenarioRegistry {
    scenarios: ArcSwap<HashMap<String, CompiledScenario>>,
    store: ScenarioStore,
}

impl ScenarioRegistry {
    pub fn new(store: ScenarioStore) -> Self {
        Self {
            scenarios: ArcSwap::new(Arc::new(HashMap::new())),
            store,
        }
    }

    /// Populate the registry from storage at startup
    pub async fn init_from_store(&self, owner_ids: &[String]) -> StoreResult<()> {
        let mut compiled = HashMap::new();
        for owner in owner_ids {
            for scenario in self.store.list_scenarios(owner).await? {
                let entry = self.compile(scenario).await?;
                compiled.insert(entry.scenario.id.clone(), entry);
            }
        }
        let loaded = compiled.len();
        self.scenarios.store(Arc::new(compiled));
        tracing::info!("initialized scenario registry with {loaded} scenarios");
        Ok(())
    }

    /// Reload one scenario after a mutation (atomic pointer swap)
    pub async fn reload_scenario(&self, scenario_id: &str) -> StoreResult<()> {
        let scenario = self.store.get_scenario(scenario_id).await?;
        let compiled = self.compile(scenario).await?;

        let current = self.scenarios.load();
        let mut next = (**current).clone();
        next.insert(scenario_id.to_string(), compiled);
        self.scenarios.store(Arc::new(next));

        tracing::debug!(scenario_id, "reloaded scenario into registry");
        Ok(())
    }

    pub fn remove_scenario(&self, scenario_id: &str) {
        let current = self.scenarios.load();
        let mut next = (**current).clone();
        if next.remove(scenario_id).is_some() {
            self.scenarios.store(Arc::new(next));
            tracing::debug!(scenario_id, "removed scenario from registry");
        }
    }

    /// Lock-free read; falls back to storage on a cache miss
    pub async fn get_or_load(&self, scenario_id: &str) -> StoreResult<CompiledScenario> {
        if let Some(found) = self.scenarios.load().get(scenario_id) {
            return Ok(found.clone());
        }

        let scenario = self.store.get_scenario(scenario_id).await?;
        let compiled = self.compile(scenario).await?;

        let current = self.scenarios.load();
        let mut next = (**current).clone();
        next.insert(scenario_id.to_string(), compiled.clone());
        self.scenarios.store(Arc::new(next));

        Ok(compiled)
    }

    async fn compile(&self, scenario: Scenario) -> StoreResult<CompiledScenario> {
        let nodes = self.store.list_nodes(&scenario.id).await?;
        let connections = self.store.list_connections(&scenario.id).await?;
        let trigger_node_ids = nodes
            .iter()
            .filter(|n| n.node_type == NODE_TYPE_TRIGGER)
            .map(|n| n.id.clone())
            .collect();
        Ok(CompiledScenario {
            scenario,
            nodes,
            connections,
            trigger_node_ids,
        })
    }
}
