use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use gantry_common::{
    Environment, ModelSpec, NodeRecord, QueueDepth, QueueDepthSample, ReconcileError,
    SchedulingStrategy,
};

#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

async fn get_data<T: DeserializeOwned>(
    http: &reqwest::Client,
    service: &'static str,
    url: &str,
) -> Result<T, ReconcileError> {
    let resp = http
        .get(url)
        .send()
        .await
        .map_err(|e| ReconcileError::transport(url, e))?
        .error_for_status()
        .map_err(|e| ReconcileError::Collaborator {
            service,
            detail: e.to_string(),
        })?;
    let envelope: Envelope<T> = resp.json().await.map_err(|e| ReconcileError::Collaborator {
        service,
        detail: e.to_string(),
    })?;
    Ok(envelope.data)
}

/// Read-only client for the node/model/environment registry collaborator.
/// All records are owned there; this service never writes them.
pub struct RegistryClient {
    base_url: String,
    http: reqwest::Client,
}

impl RegistryClient {
    pub fn new(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub async fn nodes(&self) -> Result<Vec<NodeRecord>, ReconcileError> {
        let url = format!("{}/api/v1/nodes", self.base_url);
        get_data(&self.http, "registry", &url).await
    }

    pub async fn node(&self, node_id: i64) -> Result<NodeRecord, ReconcileError> {
        let url = format!("{}/api/v1/nodes/{node_id}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| ReconcileError::transport(&url, e))?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Err(ReconcileError::UnknownNode { node_id });
        }
        let resp = resp
            .error_for_status()
            .map_err(|e| ReconcileError::Collaborator {
                service: "registry",
                detail: e.to_string(),
            })?;
        let envelope: Envelope<NodeRecord> =
            resp.json().await.map_err(|e| ReconcileError::Collaborator {
                service: "registry",
                detail: e.to_string(),
            })?;
        Ok(envelope.data)
    }

    pub async fn models(
        &self,
        environment_id: Option<i64>,
    ) -> Result<Vec<ModelSpec>, ReconcileError> {
        let mut url = format!("{}/api/v1/models", self.base_url);
        if let Some(env) = environment_id {
            url.push_str(&format!("?environment_id={env}"));
        }
        get_data(&self.http, "registry", &url).await
    }

    pub async fn environments(&self) -> Result<Vec<Environment>, ReconcileError> {
        let url = format!("{}/api/v1/environments", self.base_url);
        get_data(&self.http, "registry", &url).await
    }

    pub async fn strategies(&self) -> Result<Vec<SchedulingStrategy>, ReconcileError> {
        let url = format!("{}/api/v1/scheduling-strategies", self.base_url);
        get_data(&self.http, "registry", &url).await
    }
}

/// Read-only client for the queue-metrics collaborator.
pub struct QueueMetricsClient {
    base_url: String,
    http: reqwest::Client,
}

impl QueueMetricsClient {
    pub fn new(base_url: &str, http: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http,
        }
    }

    pub async fn queue_depth(&self, model_name: &str) -> Result<QueueDepth, ReconcileError> {
        let url = format!("{}/api/v1/queues/{model_name}/length", self.base_url);
        get_data(&self.http, "queue-metrics", &url).await
    }

    pub async fn queue_history(
        &self,
        model_name: &str,
        hours: Option<u32>,
    ) -> Result<Vec<QueueDepthSample>, ReconcileError> {
        let mut url = format!("{}/api/v1/queues/{model_name}/history", self.base_url);
        if let Some(hours) = hours {
            url.push_str(&format!("?hours={hours}"));
        }
        get_data(&self.http, "queue-metrics", &url).await
    }
}
