use std::sync::Arc;

use gantry_reconciler::{CommandExecutor, ReconcileScheduler, SharedMetrics};

use crate::registry::{QueueMetricsClient, RegistryClient};

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RegistryClient>,
    pub queues: Arc<QueueMetricsClient>,
    pub scheduler: Arc<ReconcileScheduler>,
    pub executor: Arc<CommandExecutor>,
    pub metrics: Arc<SharedMetrics>,
}
