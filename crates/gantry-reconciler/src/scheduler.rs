use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Notify, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use gantry_common::DeploymentSummary;

use crate::metrics::SharedMetrics;
use crate::snapshot::SnapshotBuilder;
use crate::util::now_ms;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Regular polling interval.
    pub poll_interval: Duration,
    /// Delay before the expedited post-switch refresh, giving the node
    /// time to converge before re-observation.
    pub settle_delay: Duration,
    /// How long a single consumer read keeps the scheduler observing.
    pub observation_ttl: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            settle_delay: Duration::from_secs(1),
            observation_ttl: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// A fresh summary was published.
    Refreshed,
    /// A poll was already in flight; this tick was dropped.
    Skipped,
    /// The base status fetch failed; the previous summary stands.
    Failed,
}

/// Cheap handle for signalling an expedited refresh, e.g. after a switch
/// command completes.
#[derive(Clone)]
pub struct SchedulerHandle {
    expedite: Arc<Notify>,
}

impl SchedulerHandle {
    pub(crate) fn new(expedite: Arc<Notify>) -> Self {
        Self { expedite }
    }

    /// Request a one-shot refresh after the settle delay. Does not reset
    /// the regular interval.
    pub fn expedite(&self) {
        self.expedite.notify_one();
    }
}

/// Keeps the scheduler polling while alive. Dropping the guard ends the
/// subscription.
pub struct ObserverGuard {
    scheduler: Arc<ReconcileScheduler>,
}

impl Drop for ObserverGuard {
    fn drop(&mut self) {
        self.scheduler.observers.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Drives periodic snapshot refresh and publishes the result.
///
/// The published summary is replaced atomically as a whole, so consumers
/// never see a half-updated view. Polling is suppressed while nobody is
/// observing: either a live [`ObserverGuard`] subscription or a consumer
/// read within the observation TTL counts as observation.
pub struct ReconcileScheduler {
    builder: SnapshotBuilder,
    cfg: SchedulerConfig,
    published: RwLock<Option<Arc<DeploymentSummary>>>,
    last_refreshed_ms: AtomicU64,
    last_observed_ms: AtomicU64,
    observers: AtomicUsize,
    in_flight: AtomicBool,
    expedite: Arc<Notify>,
    metrics: Arc<SharedMetrics>,
}

impl ReconcileScheduler {
    pub fn new(
        builder: SnapshotBuilder,
        cfg: SchedulerConfig,
        metrics: Arc<SharedMetrics>,
    ) -> Arc<Self> {
        Arc::new(Self {
            builder,
            cfg,
            published: RwLock::new(None),
            last_refreshed_ms: AtomicU64::new(0),
            last_observed_ms: AtomicU64::new(0),
            observers: AtomicUsize::new(0),
            in_flight: AtomicBool::new(false),
            expedite: Arc::new(Notify::new()),
            metrics,
        })
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle::new(self.expedite.clone())
    }

    pub fn subscribe(self: &Arc<Self>) -> ObserverGuard {
        self.observers.fetch_add(1, Ordering::Relaxed);
        ObserverGuard {
            scheduler: self.clone(),
        }
    }

    /// Record that a consumer just looked at the summary.
    pub fn mark_observed(&self) {
        self.last_observed_ms.store(now_ms(), Ordering::Relaxed);
    }

    pub(crate) fn is_observed(&self) -> bool {
        if self.observers.load(Ordering::Relaxed) > 0 {
            return true;
        }
        let last = self.last_observed_ms.load(Ordering::Relaxed);
        last > 0 && now_ms().saturating_sub(last) <= self.cfg.observation_ttl.as_millis() as u64
    }

    /// Last successfully published summary, if any. Counts as observation.
    pub async fn current(&self) -> Option<Arc<DeploymentSummary>> {
        self.mark_observed();
        self.published.read().await.clone()
    }

    /// Like [`Self::current`], but performs an immediate poll when nothing
    /// has been published yet (first consumer after startup).
    pub async fn current_or_poll(&self) -> Option<Arc<DeploymentSummary>> {
        self.mark_observed();
        if self.published.read().await.is_none() {
            self.poll_once().await;
        }
        self.published.read().await.clone()
    }

    pub fn last_refreshed_ms(&self) -> u64 {
        self.last_refreshed_ms.load(Ordering::Relaxed)
    }

    /// Run one reconciliation cycle. Never overlaps: if a cycle is already
    /// in flight the call is dropped, not queued.
    pub async fn poll_once(&self) -> PollOutcome {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            self.metrics.ticks_dropped_total.fetch_add(1, Ordering::Relaxed);
            debug!("poll already in flight, dropping tick");
            return PollOutcome::Skipped;
        }

        let previous = self.published.read().await.clone();
        let result = self.builder.build(None, previous.as_deref()).await;

        let outcome = match result {
            Ok(summary) => {
                *self.published.write().await = Some(Arc::new(summary));
                self.last_refreshed_ms.store(now_ms(), Ordering::Relaxed);
                self.metrics.cycles_total.fetch_add(1, Ordering::Relaxed);
                PollOutcome::Refreshed
            }
            Err(e) => {
                self.metrics.cycle_errors_total.fetch_add(1, Ordering::Relaxed);
                warn!(error = %e, "reconciliation cycle failed, keeping previous summary");
                PollOutcome::Failed
            }
        };
        self.in_flight.store(false, Ordering::Release);
        outcome
    }

    /// Main loop: fixed-interval polling plus expedited one-shot refreshes.
    /// Ticks that fire while a poll is still running are skipped, and ticks
    /// with no observer are no-ops.
    pub async fn run(self: Arc<Self>) {
        info!(
            interval_secs = self.cfg.poll_interval.as_secs(),
            "reconcile loop started"
        );
        let mut interval = tokio::time::interval(self.cfg.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if !self.is_observed() {
                        debug!("no active observer, skipping poll");
                        continue;
                    }
                    self.poll_once().await;
                }
                _ = self.expedite.notified() => {
                    // Post-switch refresh: the node needs a moment before
                    // re-observation says anything meaningful.
                    tokio::time::sleep(self.cfg.settle_delay).await;
                    self.poll_once().await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use async_trait::async_trait;

    use gantry_common::ReconcileError;

    use crate::snapshot::SnapshotBuilder;
    use crate::sources::{CatalogDiscovery, StatusSource};

    use super::*;

    struct NoDiscovery;

    #[async_trait]
    impl CatalogDiscovery for NoDiscovery {
        async fn supported_models(
            &self,
            node_ip: &str,
            _node_port: u16,
        ) -> Result<std::collections::HashMap<String, String>, ReconcileError> {
            Err(ReconcileError::transport(node_ip, "unused in these tests"))
        }
    }

    /// Status source that can be flipped into failure mode.
    struct ToggleStatus {
        fail: AtomicBool,
        summary: DeploymentSummary,
    }

    #[async_trait]
    impl StatusSource for ToggleStatus {
        async fn deployment_status(
            &self,
            _environment_id: Option<i64>,
        ) -> Result<DeploymentSummary, ReconcileError> {
            if self.fail.load(Ordering::Relaxed) {
                Err(ReconcileError::snapshot("aggregator down"))
            } else {
                Ok(self.summary.clone())
            }
        }
    }

    /// Status source that parks until released, to hold a poll in flight.
    struct BlockingStatus {
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl StatusSource for BlockingStatus {
        async fn deployment_status(
            &self,
            _environment_id: Option<i64>,
        ) -> Result<DeploymentSummary, ReconcileError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(DeploymentSummary::default())
        }
    }

    fn scheduler_with(status: Arc<dyn StatusSource>) -> Arc<ReconcileScheduler> {
        let metrics = Arc::new(SharedMetrics::default());
        let builder = SnapshotBuilder::new(status, Arc::new(NoDiscovery), metrics.clone());
        ReconcileScheduler::new(builder, SchedulerConfig::default(), metrics)
    }

    #[tokio::test]
    async fn failed_cycle_retains_previous_summary() {
        let status = Arc::new(ToggleStatus {
            fail: AtomicBool::new(false),
            summary: DeploymentSummary::default(),
        });
        let scheduler = scheduler_with(status.clone());

        assert_eq!(scheduler.poll_once().await, PollOutcome::Refreshed);
        let first = scheduler.current().await.unwrap();

        status.fail.store(true, Ordering::Relaxed);
        assert_eq!(scheduler.poll_once().await, PollOutcome::Failed);

        let after = scheduler.current().await.unwrap();
        assert!(Arc::ptr_eq(&first, &after));
    }

    #[tokio::test]
    async fn concurrent_poll_is_dropped_not_queued() {
        let status = Arc::new(BlockingStatus {
            entered: Notify::new(),
            release: Notify::new(),
        });
        let scheduler = scheduler_with(status.clone());

        let bg = {
            let scheduler = scheduler.clone();
            tokio::spawn(async move { scheduler.poll_once().await })
        };
        status.entered.notified().await;

        assert_eq!(scheduler.poll_once().await, PollOutcome::Skipped);
        assert_eq!(
            scheduler
                .metrics
                .ticks_dropped_total
                .load(Ordering::Relaxed),
            1
        );

        status.release.notify_one();
        assert_eq!(bg.await.unwrap(), PollOutcome::Refreshed);
    }

    #[tokio::test]
    async fn observation_requires_subscriber_or_recent_read() {
        let status = Arc::new(ToggleStatus {
            fail: AtomicBool::new(false),
            summary: DeploymentSummary::default(),
        });
        let scheduler = scheduler_with(status);

        assert!(!scheduler.is_observed());

        let guard = scheduler.subscribe();
        assert!(scheduler.is_observed());
        drop(guard);
        assert!(!scheduler.is_observed());

        scheduler.mark_observed();
        assert!(scheduler.is_observed());
    }

    #[tokio::test]
    async fn first_read_triggers_an_immediate_poll() {
        let status = Arc::new(ToggleStatus {
            fail: AtomicBool::new(false),
            summary: DeploymentSummary::default(),
        });
        let scheduler = scheduler_with(status);

        assert!(scheduler.current().await.is_none());
        assert!(scheduler.current_or_poll().await.is_some());
    }
}
