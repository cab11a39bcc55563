use std::collections::HashMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::warn;

use gantry_common::{DeploymentSummary, NodeDeploymentStatus, ReconcileError};

use crate::catalog::merge_models;
use crate::metrics::SharedMetrics;
use crate::sources::{CatalogDiscovery, StatusSource};

/// Assembles one consistent [`DeploymentSummary`] per cycle.
///
/// The base status fetch is all-or-nothing; per-node catalog discovery runs
/// in parallel afterwards and is allowed to fail node by node. A node whose
/// discovery failed keeps exactly the model set it entered the cycle with.
pub struct SnapshotBuilder {
    status: Arc<dyn StatusSource>,
    discovery: Arc<dyn CatalogDiscovery>,
    metrics: Arc<SharedMetrics>,
}

impl SnapshotBuilder {
    pub fn new(
        status: Arc<dyn StatusSource>,
        discovery: Arc<dyn CatalogDiscovery>,
        metrics: Arc<SharedMetrics>,
    ) -> Self {
        Self {
            status,
            discovery,
            metrics,
        }
    }

    pub async fn build(
        &self,
        environment_id: Option<i64>,
        previous: Option<&DeploymentSummary>,
    ) -> Result<DeploymentSummary, ReconcileError> {
        let mut summary = self.status.deployment_status(environment_id).await?;

        // Seed each node with the catalogs discovered in earlier cycles so
        // the set only grows within a session. The registered set comes
        // fresh from the base fetch and is never touched here.
        if let Some(prev) = previous {
            let prev_by_id: HashMap<i64, &NodeDeploymentStatus> = prev
                .deployment_statuses
                .iter()
                .map(|n| (n.node_id, n))
                .collect();
            for node in &mut summary.deployment_statuses {
                if let Some(old) = prev_by_id.get(&node.node_id) {
                    node.discovered_models
                        .extend(old.discovered_models.iter().cloned());
                }
            }
        }

        let discoveries = summary
            .deployment_statuses
            .iter()
            .map(|node| self.discovery.supported_models(&node.node_ip, node.node_port));
        let results = join_all(discoveries).await;

        for (node, result) in summary.deployment_statuses.iter_mut().zip(results) {
            match result {
                Ok(catalog) => {
                    node.discovered_models = merge_models(&node.discovered_models, &catalog);
                }
                Err(e) => {
                    self.metrics
                        .discovery_failures_total
                        .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                    warn!(
                        node_id = node.node_id,
                        node = %format!("{}:{}", node.node_ip, node.node_port),
                        error = %e,
                        "catalog discovery failed, keeping pre-cycle model set"
                    );
                }
            }
        }

        summary.recount_model_stats();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use async_trait::async_trait;

    use gantry_common::{DeployedModelInfo, DeployedModelState, GpuDeploymentStatus};

    use super::*;

    struct FixedStatus(DeploymentSummary);

    #[async_trait]
    impl StatusSource for FixedStatus {
        async fn deployment_status(
            &self,
            _environment_id: Option<i64>,
        ) -> Result<DeploymentSummary, ReconcileError> {
            Ok(self.0.clone())
        }
    }

    struct FailingStatus;

    #[async_trait]
    impl StatusSource for FailingStatus {
        async fn deployment_status(
            &self,
            _environment_id: Option<i64>,
        ) -> Result<DeploymentSummary, ReconcileError> {
            Err(ReconcileError::snapshot("aggregator unreachable"))
        }
    }

    /// Discovery keyed by node ip; a missing entry simulates a dead node.
    struct MapDiscovery(HashMap<String, HashMap<String, String>>);

    #[async_trait]
    impl CatalogDiscovery for MapDiscovery {
        async fn supported_models(
            &self,
            node_ip: &str,
            _node_port: u16,
        ) -> Result<HashMap<String, String>, ReconcileError> {
            self.0
                .get(node_ip)
                .cloned()
                .ok_or_else(|| ReconcileError::transport(node_ip, "connection refused"))
        }
    }

    fn node(id: i64, ip: &str, registered: &[&str], deployed: Option<&str>) -> NodeDeploymentStatus {
        NodeDeploymentStatus {
            node_id: id,
            node_ip: ip.to_string(),
            node_port: 6004,
            environment_id: Some(1),
            registered_models: registered.iter().map(|s| s.to_string()).collect(),
            discovered_models: BTreeSet::new(),
            available_gpu_ids: [0].into_iter().collect(),
            gpus: vec![GpuDeploymentStatus {
                deployed_model: deployed.map(|m| DeployedModelInfo {
                    model_name: m.to_string(),
                    state: DeployedModelState::Running,
                }),
                ..GpuDeploymentStatus::empty(0)
            }],
        }
    }

    fn builder(
        base: DeploymentSummary,
        discovery: HashMap<String, HashMap<String, String>>,
    ) -> (SnapshotBuilder, Arc<SharedMetrics>) {
        let metrics = Arc::new(SharedMetrics::default());
        (
            SnapshotBuilder::new(
                Arc::new(FixedStatus(base)),
                Arc::new(MapDiscovery(discovery)),
                metrics.clone(),
            ),
            metrics,
        )
    }

    #[tokio::test]
    async fn partial_discovery_enriches_only_reachable_nodes() {
        let base = DeploymentSummary {
            model_stats: vec![],
            deployment_statuses: vec![
                node(1, "10.0.0.1", &["mam"], Some("mam")),
                node(2, "10.0.0.2", &["fastfit"], None),
            ],
        };
        let discovery = HashMap::from([(
            "10.0.0.1".to_string(),
            HashMap::from([("X".to_string(), "triton".to_string())]),
        )]);
        let (builder, metrics) = builder(base, discovery);

        let summary = builder.build(None, None).await.unwrap();

        let n1 = &summary.deployment_statuses[0];
        let n2 = &summary.deployment_statuses[1];
        assert!(n1.available_models().contains("X"));
        assert!(n1.available_models().contains("mam"));
        // Node 2 keeps exactly its pre-cycle set.
        assert_eq!(
            n2.available_models(),
            ["fastfit".to_string()].into_iter().collect()
        );
        assert_eq!(summary.model_stats.len(), 1);
        assert_eq!(summary.model_stats[0].model_name, "mam");
        assert_eq!(summary.model_stats[0].count, 1);
        assert_eq!(
            metrics
                .discovery_failures_total
                .load(std::sync::atomic::Ordering::Relaxed),
            1
        );
    }

    #[tokio::test]
    async fn discovery_is_deduplicated_against_registration() {
        let base = DeploymentSummary {
            model_stats: vec![],
            deployment_statuses: vec![node(1, "10.0.0.1", &["mam"], None)],
        };
        let discovery = HashMap::from([(
            "10.0.0.1".to_string(),
            HashMap::from([
                ("mam".to_string(), "triton".to_string()),
                ("yolo".to_string(), "onnx".to_string()),
            ]),
        )]);
        let (builder, _) = builder(base, discovery);

        let summary = builder.build(None, None).await.unwrap();
        let models: Vec<String> = summary.deployment_statuses[0]
            .available_models()
            .into_iter()
            .collect();
        assert_eq!(models, vec!["mam", "yolo"]);
    }

    #[tokio::test]
    async fn previously_discovered_models_survive_a_failed_discovery() {
        let mut previous = DeploymentSummary {
            model_stats: vec![],
            deployment_statuses: vec![node(1, "10.0.0.1", &["mam"], None)],
        };
        previous.deployment_statuses[0]
            .discovered_models
            .insert("yolo".to_string());

        let base = DeploymentSummary {
            model_stats: vec![],
            deployment_statuses: vec![node(1, "10.0.0.1", &["mam"], None)],
        };
        // No entry for 10.0.0.1: discovery fails this cycle.
        let (builder, _) = builder(base, HashMap::new());

        let summary = builder.build(None, Some(&previous)).await.unwrap();
        assert!(summary.deployment_statuses[0]
            .discovered_models
            .contains("yolo"));
    }

    #[tokio::test]
    async fn base_fetch_failure_is_fatal_to_the_cycle() {
        let builder = SnapshotBuilder::new(
            Arc::new(FailingStatus),
            Arc::new(MapDiscovery(HashMap::new())),
            Arc::new(SharedMetrics::default()),
        );
        let err = builder.build(None, None).await.unwrap_err();
        assert!(matches!(err, ReconcileError::Snapshot { .. }));
    }
}
