use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time queue length for a model's backing queue.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueDepth {
    pub model_name: String,
    pub length: u64,
    #[serde(default)]
    pub consumers: Option<u32>,
}

/// One historical queue-length sample from the queue metrics collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueDepthSample {
    pub length: u64,
    pub timestamp: DateTime<Utc>,
}
