mod args;
mod handlers;
mod registry;
mod state;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use clap::Parser;

use gantry_common::telemetry::init_tracing;
use gantry_node_client::NodeManager;
use gantry_reconciler::{
    CommandExecutor, HttpStatusSource, PlacementLocks, ReconcileScheduler, SchedulerConfig,
    SharedMetrics, SnapshotBuilder,
};

use crate::args::Args;
use crate::handlers::{
    deployment_status, get_node, healthz, list_environments, list_models, list_nodes,
    list_strategies, metrics, queue_depth, queue_history, refresh_deployments, switch_model,
};
use crate::registry::{QueueMetricsClient, RegistryClient};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let provider = init_tracing(
        "gantry-server",
        args.otlp_endpoint.as_deref(),
        args.otlp_token.as_deref(),
    );

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(3))
        .timeout(Duration::from_secs(args.read_timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            tracing::error!(error=%e, "failed to build reqwest client");
            std::process::exit(1);
        });

    let nodes = Arc::new(NodeManager::new(
        Duration::from_secs(args.read_timeout_secs),
        Duration::from_secs(args.command_timeout_secs),
    ));
    let shared_metrics = Arc::new(SharedMetrics::default());

    let builder = SnapshotBuilder::new(
        Arc::new(HttpStatusSource::new(&args.aggregator_url, http.clone())),
        nodes.clone(),
        shared_metrics.clone(),
    );
    let scheduler = ReconcileScheduler::new(
        builder,
        SchedulerConfig {
            poll_interval: Duration::from_secs(args.poll_interval_secs),
            settle_delay: Duration::from_millis(args.settle_delay_ms),
            observation_ttl: Duration::from_secs(args.observation_ttl_secs),
        },
        shared_metrics.clone(),
    );
    let executor = Arc::new(CommandExecutor::new(
        nodes,
        PlacementLocks::new(),
        scheduler.handle(),
        shared_metrics.clone(),
    ));

    tokio::spawn(scheduler.clone().run());

    let st = AppState {
        registry: Arc::new(RegistryClient::new(&args.registry_url, http.clone())),
        queues: Arc::new(QueueMetricsClient::new(&args.queue_url, http)),
        scheduler,
        executor,
        metrics: shared_metrics,
    };

    let api_routes = Router::new()
        .route("/deployments/status", get(deployment_status))
        .route("/deployments/refresh", post(refresh_deployments))
        .route("/nodes", get(list_nodes))
        .route("/nodes/:node_id", get(get_node))
        .route("/nodes/:node_id/gpus/:gpu_id/switch", post(switch_model))
        .route("/models", get(list_models))
        .route("/environments", get(list_environments))
        .route("/strategies", get(list_strategies))
        .route("/queues/:model_name", get(queue_depth))
        .route("/queues/:model_name/history", get(queue_history))
        .with_state(st.clone());

    let app = Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics))
        .with_state(st);

    let listener = tokio::net::TcpListener::bind(&args.listen_addr).await?;
    tracing::info!(addr = %args.listen_addr, "gantry server listening");
    axum::serve(listener, app).await?;

    if let Some(provider) = provider {
        let _ = provider.shutdown();
    }
    Ok(())
}
