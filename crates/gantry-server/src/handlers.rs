use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use gantry_common::ReconcileError;
use gantry_reconciler::{PollOutcome, SwitchRequest};

use crate::state::AppState;

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
    request_id: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

fn error_response(status: StatusCode, code: &str, message: &str) -> Response {
    let body = ErrorResponse {
        error: ErrorDetail {
            code: code.to_string(),
            message: message.to_string(),
            request_id: format!("req_{}", Uuid::new_v4()),
        },
    };
    (status, Json(body)).into_response()
}

fn ok_response(data: impl Serialize) -> Response {
    Json(json!({ "data": data })).into_response()
}

fn map_error(e: ReconcileError) -> Response {
    match &e {
        ReconcileError::UnknownNode { .. } => {
            error_response(StatusCode::NOT_FOUND, "unknown_node", &e.to_string())
        }
        ReconcileError::PlacementBusy { .. } => {
            error_response(StatusCode::CONFLICT, "placement_busy", &e.to_string())
        }
        ReconcileError::CommandTimeout { .. } => {
            error_response(StatusCode::GATEWAY_TIMEOUT, "command_timeout", &e.to_string())
        }
        ReconcileError::Snapshot { .. } => {
            error_response(StatusCode::SERVICE_UNAVAILABLE, "snapshot_failed", &e.to_string())
        }
        ReconcileError::Transport { .. } | ReconcileError::Collaborator { .. } => {
            error_response(StatusCode::BAD_GATEWAY, "upstream_error", &e.to_string())
        }
    }
}

pub async fn healthz() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

pub async fn metrics(State(st): State<AppState>) -> impl IntoResponse {
    st.metrics.render_prometheus()
}

#[derive(Deserialize)]
pub struct StatusQuery {
    pub environment_id: Option<i64>,
}

/// Current fleet snapshot. Reading counts as observation and keeps the
/// background poll loop alive for the observation TTL.
pub async fn deployment_status(
    State(st): State<AppState>,
    Query(q): Query<StatusQuery>,
) -> Response {
    let Some(summary) = st.scheduler.current_or_poll().await else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "snapshot_unavailable",
            "no deployment snapshot has been published yet",
        );
    };
    match q.environment_id {
        Some(env) => ok_response(summary.filtered(env)),
        None => ok_response(summary.as_ref()),
    }
}

pub async fn refresh_deployments(State(st): State<AppState>) -> Response {
    st.scheduler.mark_observed();
    let outcome = st.scheduler.poll_once().await;
    let state = match outcome {
        PollOutcome::Refreshed => "refreshed",
        PollOutcome::Skipped => "skipped",
        PollOutcome::Failed => "failed",
    };
    ok_response(json!({ "refresh": state }))
}

/// Replace (or just stop/start) the model on one GPU slot.
///
/// Returns 409 when a switch is already in flight for the slot and the
/// switch outcome as the body otherwise, partial outcomes included.
pub async fn switch_model(
    State(st): State<AppState>,
    Path((node_id, gpu_id)): Path<(i64, u32)>,
    Json(request): Json<SwitchRequest>,
) -> Response {
    let node = match st.registry.node(node_id).await {
        Ok(node) => node,
        Err(e) => return map_error(e),
    };
    if !node.available_gpu_ids.is_empty() && !node.available_gpu_ids.contains(&gpu_id) {
        return error_response(
            StatusCode::BAD_REQUEST,
            "invalid_gpu",
            &format!("gpu {gpu_id} is not available on node {node_id}"),
        );
    }

    match st.executor.switch(&node, gpu_id, &request).await {
        Ok(outcome) => ok_response(outcome),
        Err(e) => map_error(e),
    }
}

pub async fn list_nodes(State(st): State<AppState>) -> Response {
    match st.registry.nodes().await {
        Ok(nodes) => ok_response(nodes),
        Err(e) => map_error(e),
    }
}

pub async fn get_node(State(st): State<AppState>, Path(node_id): Path<i64>) -> Response {
    match st.registry.node(node_id).await {
        Ok(node) => ok_response(node),
        Err(e) => map_error(e),
    }
}

pub async fn list_models(State(st): State<AppState>, Query(q): Query<StatusQuery>) -> Response {
    match st.registry.models(q.environment_id).await {
        Ok(models) => ok_response(models),
        Err(e) => map_error(e),
    }
}

pub async fn list_environments(State(st): State<AppState>) -> Response {
    match st.registry.environments().await {
        Ok(environments) => ok_response(environments),
        Err(e) => map_error(e),
    }
}

pub async fn list_strategies(State(st): State<AppState>) -> Response {
    match st.registry.strategies().await {
        Ok(strategies) => ok_response(strategies),
        Err(e) => map_error(e),
    }
}

pub async fn queue_depth(State(st): State<AppState>, Path(model_name): Path<String>) -> Response {
    match st.queues.queue_depth(&model_name).await {
        Ok(depth) => ok_response(depth),
        Err(e) => map_error(e),
    }
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub hours: Option<u32>,
}

pub async fn queue_history(
    State(st): State<AppState>,
    Path(model_name): Path<String>,
    Query(q): Query<HistoryQuery>,
) -> Response {
    match st.queues.queue_history(&model_name, q.hours).await {
        Ok(samples) => ok_response(samples),
        Err(e) => map_error(e),
    }
}
