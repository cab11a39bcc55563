use std::collections::HashMap;
use std::time::Duration;

use gantry_common::{GpuTelemetry, ModelInstance, ReconcileError};

/// HTTP client for one node's local inference agent.
///
/// Every method is a single remote call with no retries. Status and
/// discovery reads run under the client's default (short) timeout;
/// start/stop commands override it with the long command timeout because a
/// model load or unload can take minutes.
pub struct NodeClient {
    base_url: String,
    http: reqwest::Client,
    command_timeout: Duration,
}

impl NodeClient {
    pub fn new(
        node_ip: &str,
        node_port: u16,
        http: reqwest::Client,
        command_timeout: Duration,
    ) -> Self {
        Self {
            base_url: format!("http://{node_ip}:{node_port}"),
            http,
            command_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Liveness probe against the agent root. Any error counts as down.
    pub async fn health_check(&self) -> bool {
        match self.http.get(&self.base_url).send().await {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(node=%self.base_url, error=%e, "health check failed");
                false
            }
        }
    }

    /// GPU metrics for every GPU the node exposes. May be empty.
    pub async fn gpu_status(&self) -> Result<Vec<GpuTelemetry>, ReconcileError> {
        let url = format!("{}/api/v1/gpus", self.base_url);
        self.get_json(&url).await
    }

    /// Status of every model process currently running on the node.
    pub async fn model_status(&self) -> Result<Vec<ModelInstance>, ReconcileError> {
        let url = format!("{}/api/v1/models/status", self.base_url);
        self.get_json(&url).await
    }

    /// Supported-model catalog: model name → backend type (e.g. "triton").
    pub async fn supported_models(&self) -> Result<HashMap<String, String>, ReconcileError> {
        let url = format!("{}/api/v1/models/supported", self.base_url);
        self.get_json(&url).await
    }

    /// Ask the node to start `model_name` on `gpu_id`. Fire-and-forget
    /// relative to convergence: an acknowledgement means the command was
    /// accepted, not that the model is serving.
    pub async fn start_model(
        &self,
        model_name: &str,
        gpu_id: u32,
        config: Option<&serde_json::Value>,
    ) -> Result<(), ReconcileError> {
        let url = format!("{}/api/v1/models/start", self.base_url);
        let payload = serde_json::json!({
            "model_name": model_name,
            "gpu_id": gpu_id,
            "config": config.cloned().unwrap_or_else(|| serde_json::json!({})),
        });
        self.post_command("start", &url, &payload, model_name, gpu_id)
            .await
    }

    /// Ask the node to stop `model_name` on `gpu_id`.
    pub async fn stop_model(&self, model_name: &str, gpu_id: u32) -> Result<(), ReconcileError> {
        let url = format!("{}/api/v1/models/stop", self.base_url);
        let payload = serde_json::json!({
            "model_name": model_name,
            "gpu_id": gpu_id,
        });
        self.post_command("stop", &url, &payload, model_name, gpu_id)
            .await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
    ) -> Result<T, ReconcileError> {
        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ReconcileError::transport(&self.base_url, e))?
            .error_for_status()
            .map_err(|e| ReconcileError::transport(&self.base_url, e))?;
        resp.json()
            .await
            .map_err(|e| ReconcileError::transport(&self.base_url, e))
    }

    async fn post_command(
        &self,
        command: &'static str,
        url: &str,
        payload: &serde_json::Value,
        model_name: &str,
        gpu_id: u32,
    ) -> Result<(), ReconcileError> {
        let result = self
            .http
            .post(url)
            .timeout(self.command_timeout)
            .json(payload)
            .send()
            .await;

        let resp = match result {
            Ok(resp) => resp,
            Err(e) if e.is_timeout() => {
                return Err(ReconcileError::CommandTimeout {
                    command,
                    model: model_name.to_string(),
                    gpu_id,
                });
            }
            Err(e) => return Err(ReconcileError::transport(&self.base_url, e)),
        };

        resp.error_for_status()
            .map(|_| ())
            .map_err(|e| ReconcileError::transport(&self.base_url, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_agent_gpu_payload() {
        let raw = r#"[
            {"id": 0, "memory_usage": 41.5, "memory_total": 24576, "power_draw": 180.0, "power_limit": 450},
            {"id": 1}
        ]"#;
        let gpus: Vec<GpuTelemetry> = serde_json::from_str(raw).unwrap();
        assert_eq!(gpus.len(), 2);
        assert_eq!(gpus[0].id, 0);
        assert_eq!(gpus[0].memory_usage, Some(41.5));
        assert_eq!(gpus[1].power_draw, None);
    }

    #[test]
    fn parses_model_status_payload() {
        let raw = r#"[{"model_name": "mam", "gpu_id": 0, "pid": 4321}]"#;
        let instances: Vec<ModelInstance> = serde_json::from_str(raw).unwrap();
        assert_eq!(instances[0].model_name, "mam");
        assert_eq!(instances[0].gpu_id, 0);
    }

    #[test]
    fn base_url_includes_port() {
        let client = NodeClient::new(
            "10.0.0.5",
            6004,
            reqwest::Client::new(),
            Duration::from_secs(180),
        );
        assert_eq!(client.base_url(), "http://10.0.0.5:6004");
    }
}
