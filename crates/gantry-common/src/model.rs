use serde::{Deserialize, Serialize};

/// Registry record for an inference model. Owned by the model-registry CRUD
/// collaborator; read-only reference data for display and selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelSpec {
    pub id: i64,
    pub model_name: String,
    pub environment_id: i64,
    /// Average inference time in seconds, when known.
    #[serde(default)]
    pub average_inference_time: Option<f64>,
    #[serde(default, flatten)]
    pub queue: Option<QueueBackend>,
}

/// Optional queue-backend connection parameters for a model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueBackend {
    pub queue_host: String,
    #[serde(default = "default_queue_port")]
    pub queue_port: u16,
    #[serde(default)]
    pub queue_username: Option<String>,
    #[serde(default)]
    pub queue_password: Option<String>,
    pub queue_name: String,
}

fn default_queue_port() -> u16 {
    15672
}
