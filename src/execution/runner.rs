/// Scenario execution runner
///
/// Builds a petgraph DAG from a compiled scenario, walks the non-trigger
/// nodes in topological order, and drives the tracker through per-node
/// transitions. Actual step behavior is behind the `ActionInvoker` seam:
/// given a node's config and the upstream output, invoke an opaque action
/// and report success or failure. A failed node is recorded and the walk
/// continues with the remaining nodes.

use crate::error::StoreResult;
use crate::execution::tracker::ExecutionTracker;
use crate::scenario::types::{Node, NODE_TYPE_TRIGGER};
use crate::scenario::ScenarioRegistry;
use futures::future::BoxFuture;
use petgraph::algo::toposort;
use petgraph::graph::DiGraph;
use serde_json::{json, Value};
use std::{collections::HashMap, sync::Arc};

/// Seam to the per-integration action clients
///
/// Implementations receive the node (type tag plus opaque config) and the
/// output of the upstream node, and return this node's output.
pub trait ActionInvoker: Send + Sync {
    fn invoke<'a>(&'a self, node: &'a Node, input: Value) -> BoxFuture<'a, anyhow::Result<Value>>;
}

/// Default invoker: acknowledges every action without side effects
///
/// Stands in until concrete integration clients are plugged into the seam.
pub struct AckInvoker;

impl ActionInvoker for AckInvoker {
    fn invoke<'a>(&'a self, node: &'a Node, input: Value) -> BoxFuture<'a, anyhow::Result<Value>> {
        Box::pin(async move {
            Ok(json!({
                "acknowledged": true,
                "node_id": node.id,
                "node_type": node.node_type,
                "input": input,
            }))
        })
    }
}

pub struct ExecutionRunner {
    tracker: ExecutionTracker,
    registry: Arc<ScenarioRegistry>,
    invoker: Arc<dyn ActionInvoker>,
}

impl ExecutionRunner {
    pub fn new(
        tracker: ExecutionTracker,
        registry: Arc<ScenarioRegistry>,
        invoker: Arc<dyn ActionInvoker>,
    ) -> Self {
        Self {
            tracker,
            registry,
            invoker,
        }
    }

    /// Start an execution and drive it in a background task
    ///
    /// Returns the execution id immediately so callers (webhook dispatch,
    /// poll sweep) can hand it to polling clients.
    pub fn start(
        self: &Arc<Self>,
        scenario_id: &str,
        trigger: Value,
        payload: Value,
    ) -> BoxFuture<'static, StoreResult<String>> {
        let runner = Arc::clone(self);
        let scenario_id = scenario_id.to_string();
        Box::pin(async move {
            let execution_id = runner
                .tracker
                .start_execution(&scenario_id, trigger)
                .await?;
            let spawned_id = execution_id.clone();
            let spawned = Arc::clone(&runner);
            tokio::spawn(async move {
                if let Err(e) = spawned.drive(&spawned_id, &scenario_id, payload).await {
                    tracing::error!(execution_id = %spawned_id, "execution walk failed: {e}");
                }
            });
            Ok(execution_id)
        })
    }

    /// Start an execution and wait for the walk to finish
    pub async fn run_to_completion(
        &self,
        scenario_id: &str,
        trigger: Value,
        payload: Value,
    ) -> StoreResult<String> {
        let execution_id = self.tracker.start_execution(scenario_id, trigger).await?;
        self.drive(&execution_id, scenario_id, payload).await?;
        Ok(execution_id)
    }

    async fn drive(&self, execution_id: &str, scenario_id: &str, payload: Value) -> StoreResult<()> {
        let compiled = self.registry.get_or_load(scenario_id).await?;

        // Trigger nodes complete the moment they fire
        for trigger_id in &compiled.trigger_node_ids {
            self.tracker
                .mark_node_completed(execution_id, trigger_id)
                .await?;
        }

        let mut graph = DiGraph::<&Node, ()>::new();
        let mut index_by_id = HashMap::new();
        for node in &compiled.nodes {
            index_by_id.insert(node.id.as_str(), graph.add_node(node));
        }
        for edge in &compiled.connections {
            // Endpoints always resolve: the store enforces integrity at write time
            if let (Some(&from), Some(&to)) = (
                index_by_id.get(edge.source_node_id.as_str()),
                index_by_id.get(edge.target_node_id.as_str()),
            ) {
                graph.add_edge(from, to, ());
            }
        }

        let order = match toposort(&graph, None) {
            Ok(order) => order,
            Err(_) => {
                tracing::warn!(execution_id, scenario_id, "scenario graph contains a cycle");
                self.tracker
                    .fail_remaining(execution_id, "Scenario graph contains a cycle")
                    .await?;
                return Ok(());
            }
        };

        let mut upstream = payload;
        for idx in order {
            let node = graph[idx];
            if node.node_type == NODE_TYPE_TRIGGER {
                continue;
            }

            self.tracker.mark_node_running(execution_id, &node.id).await?;
            match self.invoker.invoke(node, upstream.clone()).await {
                Ok(output) => {
                    self.tracker
                        .mark_node_completed(execution_id, &node.id)
                        .await?;
                    upstream = output;
                }
                Err(e) => {
                    tracing::warn!(execution_id, node_id = %node.id, "node action failed: {e}");
                    self.tracker
                        .mark_node_failed(execution_id, &node.id, &e.to_string())
                        .await?;
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::{NewConnection, NewNode, NewScenario, ScenarioStore};
    use crate::testutil::memory_store;

    struct FailingInvoker {
        fail_label: String,
    }

    impl ActionInvoker for FailingInvoker {
        fn invoke<'a>(
            &'a self,
            node: &'a Node,
            _input: Value,
        ) -> BoxFuture<'a, anyhow::Result<Value>> {
            Box::pin(async move {
                if node.label == self.fail_label {
                    anyhow::bail!("action refused: {}", node.label);
                }
                Ok(json!({"ok": true}))
            })
        }
    }

    async fn seed(store: &ScenarioStore, labels: &[&str]) -> (String, Vec<String>) {
        let scenario_id = store
            .create_scenario(NewScenario {
                name: "runner".into(),
                description: "".into(),
                owner_id: "u1".into(),
                status: Some("active".into()),
                schedule: None,
                scenario_type: None,
                slug: None,
            })
            .await
            .unwrap();
        let mut ids = Vec::new();
        for (i, label) in labels.iter().enumerate() {
            let node_type = if i == 0 { "trigger" } else { "action" };
            ids.push(
                store
                    .create_node(NewNode {
                        scenario_id: scenario_id.clone(),
                        node_type: node_type.into(),
                        label: (*label).into(),
                        config: "{}".into(),
                        position: "{}".into(),
                        order: Some(i as i64),
                    })
                    .await
                    .unwrap(),
            );
        }
        for pair in ids.windows(2) {
            store
                .create_connection(NewConnection {
                    scenario_id: scenario_id.clone(),
                    source_node_id: pair[0].clone(),
                    target_node_id: pair[1].clone(),
                    mapping: None,
                    label: None,
                })
                .await
                .unwrap();
        }
        (scenario_id, ids)
    }

    async fn runner_with(
        store: ScenarioStore,
        invoker: Arc<dyn ActionInvoker>,
    ) -> (ExecutionRunner, ExecutionTracker) {
        let tracker = ExecutionTracker::new(store.clone());
        tracker.init_schema().await.unwrap();
        let registry = Arc::new(ScenarioRegistry::new(store));
        (
            ExecutionRunner::new(tracker.clone(), registry, invoker),
            tracker,
        )
    }

    #[tokio::test]
    async fn linear_walk_completes_every_node() {
        let store = memory_store().await;
        let (scenario_id, _) = seed(&store, &["start", "a", "b"]).await;
        let (runner, tracker) = runner_with(store, Arc::new(AckInvoker)).await;

        let exec = runner
            .run_to_completion(&scenario_id, json!({"kind": "manual"}), json!({}))
            .await
            .unwrap();

        let details = tracker.get_execution(&exec).await.unwrap();
        assert_eq!(details.summary.status, "completed");
        assert_eq!(details.summary.node_stats.completed, 3);
        assert_eq!(details.summary.progress, 100.0);
    }

    #[tokio::test]
    async fn node_failure_is_recorded_without_halting_the_walk() {
        let store = memory_store().await;
        let (scenario_id, _) = seed(&store, &["start", "bad", "after"]).await;
        let (runner, tracker) = runner_with(
            store,
            Arc::new(FailingInvoker {
                fail_label: "bad".into(),
            }),
        )
        .await;

        let exec = runner
            .run_to_completion(&scenario_id, json!({"kind": "manual"}), json!({}))
            .await
            .unwrap();

        let details = tracker.get_execution(&exec).await.unwrap();
        assert_eq!(details.summary.status, "failed");
        assert_eq!(details.summary.node_stats.failed, 1);
        assert_eq!(details.summary.node_stats.completed, 2);
        let failed = details
            .nodes
            .iter()
            .find(|n| n.error.is_some())
            .expect("one node failed");
        assert!(failed.error.as_deref().unwrap().contains("bad"));
    }

    #[tokio::test]
    async fn cyclic_graph_terminates_as_failed() {
        let store = memory_store().await;
        let (scenario_id, ids) = seed(&store, &["start", "a", "b"]).await;
        // b -> a closes a cycle between the two action nodes
        store
            .create_connection(NewConnection {
                scenario_id: scenario_id.clone(),
                source_node_id: ids[2].clone(),
                target_node_id: ids[1].clone(),
                mapping: None,
                label: None,
            })
            .await
            .unwrap();
        let (runner, tracker) = runner_with(store, Arc::new(AckInvoker)).await;

        let exec = runner
            .run_to_completion(&scenario_id, json!({"kind": "manual"}), json!({}))
            .await
            .unwrap();

        let details = tracker.get_execution(&exec).await.unwrap();
        assert_eq!(details.summary.status, "failed");
        assert!(details.summary.finished_at.is_some());
    }
}
