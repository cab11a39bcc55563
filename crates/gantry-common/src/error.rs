use thiserror::Error;

/// Error taxonomy for the deployment reconciler.
///
/// Per-node discovery failures are deliberately absent: they are logged and
/// counted at the snapshot level, never surfaced to callers as a cycle
/// failure.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Network or timeout failure reaching a node or collaborator service.
    #[error("transport error talking to {target}: {detail}")]
    Transport { target: String, detail: String },

    /// The base status fetch failed. Fatal to the cycle; the previously
    /// published summary is retained.
    #[error("snapshot fetch failed: {detail}")]
    Snapshot { detail: String },

    /// A switch sequence is already in flight for this GPU. Rejected
    /// immediately, never queued.
    #[error("switch already in flight for node {node_id} gpu {gpu_id}")]
    PlacementBusy { node_id: i64, gpu_id: u32 },

    /// A start/stop command exceeded its long timeout. Reported to the
    /// caller, never silently retried.
    #[error("{command} command for model '{model}' on gpu {gpu_id} timed out")]
    CommandTimeout {
        command: &'static str,
        model: String,
        gpu_id: u32,
    },

    /// Node id not present in the registry.
    #[error("unknown node {node_id}")]
    UnknownNode { node_id: i64 },

    /// A reference-data collaborator returned an error response.
    #[error("{service} collaborator error: {detail}")]
    Collaborator {
        service: &'static str,
        detail: String,
    },
}

impl ReconcileError {
    pub fn transport(target: impl Into<String>, detail: impl ToString) -> Self {
        Self::Transport {
            target: target.into(),
            detail: detail.to_string(),
        }
    }

    pub fn snapshot(detail: impl ToString) -> Self {
        Self::Snapshot {
            detail: detail.to_string(),
        }
    }
}
