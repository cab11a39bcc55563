use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DeployedModelState {
    Running,
    Starting,
    Unknown,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeployedModelInfo {
    pub model_name: String,
    pub state: DeployedModelState,
}

/// Point-in-time view of a single GPU slot. Never persisted; every field is
/// a live observation from the node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpuDeploymentStatus {
    pub gpu_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed_model: Option<DeployedModelInfo>,
    /// Memory-utilization percent (0–100). Not compute utilization.
    #[serde(default)]
    pub load_percent: Option<f64>,
    #[serde(default)]
    pub memory_used_mb: Option<f64>,
    #[serde(default)]
    pub memory_total_mb: Option<f64>,
    #[serde(default)]
    pub power_usage_w: Option<f64>,
    #[serde(default)]
    pub power_limit_w: Option<f64>,
}

impl GpuDeploymentStatus {
    pub fn empty(gpu_id: u32) -> Self {
        Self {
            gpu_id,
            deployed_model: None,
            load_percent: None,
            memory_used_mb: None,
            memory_total_mb: None,
            power_usage_w: None,
            power_limit_w: None,
        }
    }
}

/// Per-node slice of a deployment snapshot.
///
/// `registered_models` comes from the node's static registration in the
/// registry and is owned by the CRUD collaborator. `discovered_models` is
/// owned by the reconciler and filled from live catalog discovery. The two
/// are kept separate; anything user-facing uses [`Self::available_models`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeDeploymentStatus {
    pub node_id: i64,
    pub node_ip: String,
    pub node_port: u16,
    #[serde(default)]
    pub environment_id: Option<i64>,
    #[serde(default)]
    pub registered_models: BTreeSet<String>,
    #[serde(default)]
    pub discovered_models: BTreeSet<String>,
    #[serde(default)]
    pub available_gpu_ids: BTreeSet<u32>,
    #[serde(default)]
    pub gpus: Vec<GpuDeploymentStatus>,
}

impl NodeDeploymentStatus {
    /// Union of registered and discovered model names.
    pub fn available_models(&self) -> BTreeSet<String> {
        self.registered_models
            .union(&self.discovered_models)
            .cloned()
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelDeploymentStat {
    pub model_name: String,
    pub count: u32,
}

/// Fleet-wide snapshot handed to consumers. Rebuilt whole on every
/// reconciliation cycle and published atomically; never patched in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeploymentSummary {
    pub model_stats: Vec<ModelDeploymentStat>,
    pub deployment_statuses: Vec<NodeDeploymentStatus>,
}

impl DeploymentSummary {
    /// Recompute `model_stats` from the deployed models currently visible
    /// across all GPUs, so stats and statuses always describe the same cycle.
    pub fn recount_model_stats(&mut self) {
        let mut counts: BTreeMap<&str, u32> = BTreeMap::new();
        for node in &self.deployment_statuses {
            for gpu in &node.gpus {
                if let Some(deployed) = &gpu.deployed_model {
                    *counts.entry(deployed.model_name.as_str()).or_insert(0) += 1;
                }
            }
        }
        self.model_stats = counts
            .into_iter()
            .map(|(model_name, count)| ModelDeploymentStat {
                model_name: model_name.to_string(),
                count,
            })
            .collect();
    }

    /// Restrict the summary to nodes in one environment. Stats are
    /// recounted so they describe exactly the nodes that remain.
    pub fn filtered(&self, environment_id: i64) -> DeploymentSummary {
        let mut out = DeploymentSummary {
            model_stats: vec![],
            deployment_statuses: self
                .deployment_statuses
                .iter()
                .filter(|n| n.environment_id == Some(environment_id))
                .cloned()
                .collect(),
        };
        out.recount_model_stats();
        out
    }
}

/// Result of a switch command as reported to the caller.
///
/// `Partial` means exactly one of the requested sub-commands was
/// acknowledged; the true GPU state is unknown until the next
/// reconciliation cycle re-observes the node.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum SwitchOutcome {
    Success,
    Partial { stop_ok: bool, start_ok: bool },
    Failure,
}
