use std::collections::HashMap;

use async_trait::async_trait;
use serde::Deserialize;

use gantry_common::{DeploymentSummary, ReconcileError};
use gantry_node_client::NodeManager;

/// One-call source of the base per-node GPU/deployed-model state, the
/// status-aggregation collaborator. A failure here is fatal to the cycle.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn deployment_status(
        &self,
        environment_id: Option<i64>,
    ) -> Result<DeploymentSummary, ReconcileError>;
}

/// Per-node supported-model catalog discovery: model name → backend type.
/// Failures are per-node and never escalate past the snapshot builder.
#[async_trait]
pub trait CatalogDiscovery: Send + Sync {
    async fn supported_models(
        &self,
        node_ip: &str,
        node_port: u16,
    ) -> Result<HashMap<String, String>, ReconcileError>;
}

/// Per-node start/stop placement commands. Long-running; the node does not
/// guarantee idempotency on retry, so callers must never re-issue a failed
/// command on their own.
#[async_trait]
pub trait PlacementCommands: Send + Sync {
    async fn start_model(
        &self,
        node_ip: &str,
        node_port: u16,
        model_name: &str,
        gpu_id: u32,
        config: Option<&serde_json::Value>,
    ) -> Result<(), ReconcileError>;

    async fn stop_model(
        &self,
        node_ip: &str,
        node_port: u16,
        model_name: &str,
        gpu_id: u32,
    ) -> Result<(), ReconcileError>;
}

#[async_trait]
impl CatalogDiscovery for NodeManager {
    async fn supported_models(
        &self,
        node_ip: &str,
        node_port: u16,
    ) -> Result<HashMap<String, String>, ReconcileError> {
        self.client(node_ip, node_port).supported_models().await
    }
}

#[async_trait]
impl PlacementCommands for NodeManager {
    async fn start_model(
        &self,
        node_ip: &str,
        node_port: u16,
        model_name: &str,
        gpu_id: u32,
        config: Option<&serde_json::Value>,
    ) -> Result<(), ReconcileError> {
        self.client(node_ip, node_port)
            .start_model(model_name, gpu_id, config)
            .await
    }

    async fn stop_model(
        &self,
        node_ip: &str,
        node_port: u16,
        model_name: &str,
        gpu_id: u32,
    ) -> Result<(), ReconcileError> {
        self.client(node_ip, node_port)
            .stop_model(model_name, gpu_id)
            .await
    }
}

/// Collaborator responses arrive in a `{ data, message }` envelope.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// HTTP implementation of [`StatusSource`] against the status-aggregation
/// collaborator.
pub struct HttpStatusSource {
    base_url: String,
    http: reqwest::Client,
}

impl HttpStatusSource {
    pub fn new(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn deployment_status(
        &self,
        environment_id: Option<i64>,
    ) -> Result<DeploymentSummary, ReconcileError> {
        let url = format!("{}/api/v1/deployments/status", self.base_url);
        let mut req = self.http.get(&url);
        if let Some(env) = environment_id {
            req = req.query(&[("environment_id", env)]);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ReconcileError::snapshot(e))?
            .error_for_status()
            .map_err(|e| ReconcileError::snapshot(e))?;

        let envelope: Envelope<DeploymentSummary> = resp
            .json()
            .await
            .map_err(|e| ReconcileError::snapshot(e))?;
        Ok(envelope.data)
    }
}
