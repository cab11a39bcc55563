use std::sync::atomic::Ordering;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{info, warn};

use gantry_common::{NodeRecord, ReconcileError, SwitchOutcome};

use crate::lock::PlacementLocks;
use crate::metrics::SharedMetrics;
use crate::scheduler::SchedulerHandle;
use crate::sources::PlacementCommands;

/// One operator-requested model switch on a specific GPU slot.
///
/// `new_model = Some("")` is the "stop only" form; either field may be
/// omitted to skip that sub-command.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SwitchRequest {
    pub new_model: Option<String>,
    pub old_model: Option<String>,
    pub config: Option<serde_json::Value>,
}

/// Issues stop-then-start command sequences to a node for a given GPU,
/// serialized per GPU slot by [`PlacementLocks`].
///
/// Commands are fire-and-forget relative to convergence: the executor
/// never confirms the node reached the requested state, never rolls back,
/// and never retries. After an acknowledged (full or partial) switch it
/// asks the scheduler for an expedited refresh so the next observation
/// reflects reality.
pub struct CommandExecutor {
    commands: Arc<dyn PlacementCommands>,
    locks: PlacementLocks,
    scheduler: SchedulerHandle,
    metrics: Arc<SharedMetrics>,
}

impl CommandExecutor {
    pub fn new(
        commands: Arc<dyn PlacementCommands>,
        locks: PlacementLocks,
        scheduler: SchedulerHandle,
        metrics: Arc<SharedMetrics>,
    ) -> Self {
        Self {
            commands,
            locks,
            scheduler,
            metrics,
        }
    }

    pub async fn switch(
        &self,
        node: &NodeRecord,
        gpu_id: u32,
        request: &SwitchRequest,
    ) -> Result<SwitchOutcome, ReconcileError> {
        let new_model = request.new_model.as_deref().filter(|m| !m.is_empty());
        let old_model = request.old_model.as_deref().filter(|m| !m.is_empty());

        let _guard = match self.locks.acquire(node.id, gpu_id) {
            Ok(guard) => guard,
            Err(e) => {
                self.metrics
                    .busy_rejections_total
                    .fetch_add(1, Ordering::Relaxed);
                warn!(node_id = node.id, gpu_id, "switch rejected, GPU slot busy");
                return Err(e);
            }
        };

        if new_model.is_none() && old_model.is_none() {
            return Ok(SwitchOutcome::Success);
        }

        // The stop attempt must fully resolve before start is issued;
        // running the two concurrently could double-allocate the GPU.
        let stop_ok = match old_model {
            Some(model) => Some(
                match self
                    .commands
                    .stop_model(&node.node_ip, node.node_port, model, gpu_id)
                    .await
                {
                    Ok(()) => {
                        info!(node_id = node.id, gpu_id, model, "stop command acknowledged");
                        true
                    }
                    Err(e) => {
                        warn!(node_id = node.id, gpu_id, model, error = %e, "stop command failed");
                        false
                    }
                },
            ),
            None => None,
        };

        let start_ok = match new_model {
            Some(model) => Some(
                match self
                    .commands
                    .start_model(
                        &node.node_ip,
                        node.node_port,
                        model,
                        gpu_id,
                        request.config.as_ref(),
                    )
                    .await
                {
                    Ok(()) => {
                        info!(node_id = node.id, gpu_id, model, "start command acknowledged");
                        true
                    }
                    Err(e) => {
                        warn!(node_id = node.id, gpu_id, model, error = %e, "start command failed");
                        false
                    }
                },
            ),
            None => None,
        };

        let outcome = classify(stop_ok, start_ok);
        match outcome {
            SwitchOutcome::Success => {
                self.metrics
                    .switch_success_total
                    .fetch_add(1, Ordering::Relaxed);
                self.scheduler.expedite();
            }
            SwitchOutcome::Partial { .. } => {
                self.metrics
                    .switch_partial_total
                    .fetch_add(1, Ordering::Relaxed);
                // True GPU state is unknown; the expedited cycle will
                // re-observe it.
                self.scheduler.expedite();
            }
            SwitchOutcome::Failure => {
                self.metrics
                    .switch_failure_total
                    .fetch_add(1, Ordering::Relaxed);
            }
        }
        Ok(outcome)
    }
}

fn classify(stop_ok: Option<bool>, start_ok: Option<bool>) -> SwitchOutcome {
    match (stop_ok, start_ok) {
        (None, None) => SwitchOutcome::Success,
        (Some(true), None) | (None, Some(true)) | (Some(true), Some(true)) => {
            SwitchOutcome::Success
        }
        (Some(false), None) | (None, Some(false)) | (Some(false), Some(false)) => {
            SwitchOutcome::Failure
        }
        (Some(stop), Some(start)) => SwitchOutcome::Partial {
            stop_ok: stop,
            start_ok: start,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;

    struct ScriptedCommands {
        log: Mutex<Vec<String>>,
        fail_stop: bool,
        fail_start: bool,
        /// When set, stop parks until released (to hold the lock in tests).
        gate: Option<(Arc<Notify>, Arc<Notify>)>,
    }

    impl ScriptedCommands {
        fn ok() -> Self {
            Self {
                log: Mutex::new(vec![]),
                fail_stop: false,
                fail_start: false,
                gate: None,
            }
        }

        fn entries(&self) -> Vec<String> {
            self.log.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PlacementCommands for ScriptedCommands {
        async fn start_model(
            &self,
            _node_ip: &str,
            _node_port: u16,
            model_name: &str,
            gpu_id: u32,
            _config: Option<&serde_json::Value>,
        ) -> Result<(), ReconcileError> {
            self.log.lock().unwrap().push(format!("start:{model_name}"));
            if self.fail_start {
                Err(ReconcileError::CommandTimeout {
                    command: "start",
                    model: model_name.to_string(),
                    gpu_id,
                })
            } else {
                Ok(())
            }
        }

        async fn stop_model(
            &self,
            _node_ip: &str,
            _node_port: u16,
            model_name: &str,
            gpu_id: u32,
        ) -> Result<(), ReconcileError> {
            if let Some((entered, release)) = &self.gate {
                entered.notify_one();
                release.notified().await;
            }
            self.log.lock().unwrap().push(format!("stop:{model_name}"));
            if self.fail_stop {
                Err(ReconcileError::CommandTimeout {
                    command: "stop",
                    model: model_name.to_string(),
                    gpu_id,
                })
            } else {
                Ok(())
            }
        }
    }

    fn node() -> NodeRecord {
        NodeRecord {
            id: 1,
            node_ip: "10.0.0.1".to_string(),
            node_port: 6004,
            environment_id: None,
            available_gpu_ids: [0, 1].into_iter().collect(),
            registered_models: BTreeSet::new(),
            status: Default::default(),
        }
    }

    fn executor(
        commands: Arc<ScriptedCommands>,
    ) -> (CommandExecutor, Arc<Notify>, Arc<SharedMetrics>) {
        let expedite = Arc::new(Notify::new());
        let metrics = Arc::new(SharedMetrics::default());
        (
            CommandExecutor::new(
                commands,
                PlacementLocks::new(),
                SchedulerHandle::new(expedite.clone()),
                metrics.clone(),
            ),
            expedite,
            metrics,
        )
    }

    fn request(new_model: Option<&str>, old_model: Option<&str>) -> SwitchRequest {
        SwitchRequest {
            new_model: new_model.map(str::to_string),
            old_model: old_model.map(str::to_string),
            config: None,
        }
    }

    #[tokio::test]
    async fn empty_new_model_means_stop_only() {
        let commands = Arc::new(ScriptedCommands::ok());
        let (executor, _, _) = executor(commands.clone());

        let outcome = executor
            .switch(&node(), 0, &request(Some(""), Some("A")))
            .await
            .unwrap();

        assert_eq!(outcome, SwitchOutcome::Success);
        assert_eq!(commands.entries(), vec!["stop:A"]);
    }

    #[tokio::test]
    async fn absent_old_model_means_start_only() {
        let commands = Arc::new(ScriptedCommands::ok());
        let (executor, _, _) = executor(commands.clone());

        let outcome = executor
            .switch(&node(), 0, &request(Some("B"), None))
            .await
            .unwrap();

        assert_eq!(outcome, SwitchOutcome::Success);
        assert_eq!(commands.entries(), vec!["start:B"]);
    }

    #[tokio::test]
    async fn stop_is_issued_before_start() {
        let commands = Arc::new(ScriptedCommands::ok());
        let (executor, _, _) = executor(commands.clone());

        let outcome = executor
            .switch(&node(), 0, &request(Some("B"), Some("A")))
            .await
            .unwrap();

        assert_eq!(outcome, SwitchOutcome::Success);
        assert_eq!(commands.entries(), vec!["stop:A", "start:B"]);
    }

    #[tokio::test]
    async fn start_timeout_yields_partial_and_expedites_without_compensation() {
        let commands = Arc::new(ScriptedCommands {
            fail_start: true,
            ..ScriptedCommands::ok()
        });
        let (executor, expedite, metrics) = executor(commands.clone());

        let outcome = executor
            .switch(&node(), 0, &request(Some("B"), Some("A")))
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SwitchOutcome::Partial {
                stop_ok: true,
                start_ok: false
            }
        );
        // Exactly one stop and one start: no retry, no rollback.
        assert_eq!(commands.entries(), vec!["stop:A", "start:B"]);
        assert_eq!(metrics.switch_partial_total.load(Ordering::Relaxed), 1);
        // The expedited refresh was requested.
        tokio::time::timeout(Duration::from_millis(50), expedite.notified())
            .await
            .expect("expedited refresh not signalled");
    }

    #[tokio::test]
    async fn both_subcommands_failing_is_a_failure() {
        let commands = Arc::new(ScriptedCommands {
            fail_stop: true,
            fail_start: true,
            ..ScriptedCommands::ok()
        });
        let (executor, _, metrics) = executor(commands.clone());

        let outcome = executor
            .switch(&node(), 0, &request(Some("B"), Some("A")))
            .await
            .unwrap();

        assert_eq!(outcome, SwitchOutcome::Failure);
        assert_eq!(metrics.switch_failure_total.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn concurrent_switch_on_same_gpu_is_rejected_busy() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let commands = Arc::new(ScriptedCommands {
            gate: Some((entered.clone(), release.clone())),
            ..ScriptedCommands::ok()
        });
        let (executor, _, metrics) = executor(commands.clone());
        let executor = Arc::new(executor);

        let first = {
            let executor = executor.clone();
            tokio::spawn(async move {
                executor
                    .switch(&node(), 0, &request(None, Some("A")))
                    .await
            })
        };
        entered.notified().await;

        let second = executor.switch(&node(), 0, &request(Some("B"), None)).await;
        assert!(matches!(
            second,
            Err(ReconcileError::PlacementBusy { node_id: 1, gpu_id: 0 })
        ));
        assert_eq!(metrics.busy_rejections_total.load(Ordering::Relaxed), 1);

        // A different GPU on the same node is not affected.
        let other = executor
            .switch(&node(), 1, &request(Some("B"), None))
            .await
            .unwrap();
        assert_eq!(other, SwitchOutcome::Success);

        release.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), SwitchOutcome::Success);

        // Lock is free again after the first sequence completed.
        let retry = executor.switch(&node(), 0, &request(Some("B"), None)).await;
        assert!(retry.is_ok());
    }
}
