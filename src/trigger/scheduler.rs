/// Background poll sweep
///
/// Once a minute, finds polling triggers whose interval has elapsed and
/// starts an execution for each one's scenario. The node is re-read at fire
/// time, so triggers on deleted nodes or scenarios are skipped gracefully
/// rather than cancelled up front.

use crate::execution::ExecutionRunner;
use crate::trigger::TriggerDispatcher;
use anyhow::Result;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};

pub struct PollScheduler {
    scheduler: Arc<RwLock<JobScheduler>>,
    dispatcher: Arc<TriggerDispatcher>,
    runner: Arc<ExecutionRunner>,
}

impl PollScheduler {
    pub async fn new(
        dispatcher: Arc<TriggerDispatcher>,
        runner: Arc<ExecutionRunner>,
    ) -> Result<Self> {
        let scheduler = JobScheduler::new().await?;
        Ok(Self {
            scheduler: Arc::new(RwLock::new(scheduler)),
            dispatcher,
            runner,
        })
    }

    /// Register the minutely sweep job and start the scheduler
    pub async fn start(&self) -> Result<()> {
        let dispatcher = Arc::clone(&self.dispatcher);
        let runner = Arc::clone(&self.runner);

        let job = Job::new_async("0 * * * * *", move |_uuid, _l| {
            let dispatcher = Arc::clone(&dispatcher);
            let runner = Arc::clone(&runner);
            Box::pin(async move {
                if let Err(e) = Self::sweep_once(&dispatcher, &runner).await {
                    tracing::error!("polling sweep failed: {e}");
                }
            })
        })?;

        {
            let scheduler = self.scheduler.write().await;
            scheduler.add(job).await?;
            scheduler.start().await?;
        }

        tracing::info!("poll scheduler started (sweep every minute)");
        Ok(())
    }

    pub async fn stop(&self) -> Result<()> {
        let mut scheduler = self.scheduler.write().await;
        scheduler.shutdown().await?;
        tracing::info!("poll scheduler stopped");
        Ok(())
    }

    /// One sweep over due polling triggers
    pub async fn sweep_once(
        dispatcher: &TriggerDispatcher,
        runner: &Arc<ExecutionRunner>,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let due = dispatcher.due_polling_triggers(now).await?;
        if due.is_empty() {
            return Ok(());
        }
        tracing::debug!("polling sweep found {} due triggers", due.len());

        for node in due {
            let trigger = json!({
                "kind": "polling",
                "node_id": node.id,
            });
            match runner.start(&node.scenario_id, trigger, json!({})).await {
                Ok(execution_id) => {
                    tracing::info!(node_id = %node.id, scenario_id = %node.scenario_id,
                        execution_id = %execution_id, "polling trigger fired");
                }
                Err(e) => {
                    // Scenario may have been deleted since the trigger was configured
                    tracing::debug!(node_id = %node.id, "skipping polling trigger: {e}");
                }
            }
            dispatcher.mark_polled(&node.id, now).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::execution::{AckInvoker, ExecutionTracker};
    use crate::scenario::{NewConnection, NewNode, ScenarioRegistry};
    use crate::testutil::{memory_store, seed_trigger_node};

    #[tokio::test]
    async fn sweep_starts_executions_for_due_triggers_and_stamps_them() {
        let store = memory_store().await;
        let (scenario_id, trigger_id) = seed_trigger_node(&store).await;
        let action_id = store
            .create_node(NewNode {
                scenario_id: scenario_id.clone(),
                node_type: "action".into(),
                label: "Act".into(),
                config: "{}".into(),
                position: "{}".into(),
                order: None,
            })
            .await
            .unwrap();
        store
            .create_connection(NewConnection {
                scenario_id: scenario_id.clone(),
                source_node_id: trigger_id.clone(),
                target_node_id: action_id,
                mapping: None,
                label: None,
            })
            .await
            .unwrap();

        let tracker = ExecutionTracker::new(store.clone());
        tracker.init_schema().await.unwrap();
        let registry = Arc::new(ScenarioRegistry::new(store.clone()));
        let runner = Arc::new(ExecutionRunner::new(
            tracker.clone(),
            registry,
            Arc::new(AckInvoker),
        ));
        let dispatcher = TriggerDispatcher::new(store.clone());
        dispatcher
            .configure_polling(&trigger_id, 5, true)
            .await
            .unwrap();

        PollScheduler::sweep_once(&dispatcher, &runner).await.unwrap();

        let executions = tracker
            .list_scenario_executions(&scenario_id, 10)
            .await
            .unwrap();
        assert_eq!(executions.len(), 1);

        let node = store.get_node(&trigger_id).await.unwrap();
        assert!(node.last_polled_at.is_some());

        // Stamped, so the next sweep finds nothing due
        assert!(dispatcher
            .due_polling_triggers(chrono::Utc::now().timestamp_millis())
            .await
            .unwrap()
            .is_empty());
    }
}
