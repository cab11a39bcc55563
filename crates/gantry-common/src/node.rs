use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeHealth {
    Online,
    Offline,
    #[default]
    Unknown,
}

/// Registry record for a worker node. Owned by the node-registry CRUD
/// collaborator; the core reads it for addressing and filtering only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NodeRecord {
    pub id: i64,
    pub node_ip: String,
    pub node_port: u16,
    #[serde(default)]
    pub environment_id: Option<i64>,
    #[serde(default)]
    pub available_gpu_ids: BTreeSet<u32>,
    #[serde(default)]
    pub registered_models: BTreeSet<String>,
    #[serde(default)]
    pub status: NodeHealth,
}

impl NodeRecord {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.node_ip, self.node_port)
    }
}

/// Raw per-GPU sample as reported by a node's local agent.
/// `memory_usage` is memory-utilization percent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GpuTelemetry {
    pub id: u32,
    #[serde(default)]
    pub memory_usage: Option<f64>,
    #[serde(default)]
    pub memory_total: Option<f64>,
    #[serde(default)]
    pub power_draw: Option<f64>,
    #[serde(default)]
    pub power_limit: Option<f64>,
}

/// One running model process as reported by a node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelInstance {
    pub model_name: String,
    pub gpu_id: u32,
    #[serde(default)]
    pub pid: Option<u32>,
}
