use std::sync::atomic::{AtomicU64, Ordering};

/// Shared counters for the reconciler, safe for concurrent access.
#[derive(Debug, Default)]
pub struct SharedMetrics {
    /// Completed reconciliation cycles (successful publishes).
    pub cycles_total: AtomicU64,
    /// Cycles abandoned because the base status fetch failed.
    pub cycle_errors_total: AtomicU64,
    /// Per-node catalog discovery failures (non-fatal).
    pub discovery_failures_total: AtomicU64,
    /// Interval ticks dropped because a poll was already in flight.
    pub ticks_dropped_total: AtomicU64,
    /// Switch commands fully acknowledged.
    pub switch_success_total: AtomicU64,
    /// Switch commands where exactly one sub-command was acknowledged.
    pub switch_partial_total: AtomicU64,
    /// Switch commands where no sub-command was acknowledged.
    pub switch_failure_total: AtomicU64,
    /// Switch requests rejected because the GPU slot was locked.
    pub busy_rejections_total: AtomicU64,
}

impl SharedMetrics {
    /// Prometheus text exposition of all counters.
    pub fn render_prometheus(&self) -> String {
        format!(
            "# HELP gantry_cycles_total Completed reconciliation cycles.\n\
             # TYPE gantry_cycles_total counter\n\
             gantry_cycles_total {}\n\
             # HELP gantry_cycle_errors_total Cycles abandoned on base status failure.\n\
             # TYPE gantry_cycle_errors_total counter\n\
             gantry_cycle_errors_total {}\n\
             # HELP gantry_discovery_failures_total Per-node catalog discovery failures.\n\
             # TYPE gantry_discovery_failures_total counter\n\
             gantry_discovery_failures_total {}\n\
             # HELP gantry_ticks_dropped_total Poll ticks dropped while a poll was in flight.\n\
             # TYPE gantry_ticks_dropped_total counter\n\
             gantry_ticks_dropped_total {}\n\
             # HELP gantry_switch_success_total Fully acknowledged switch commands.\n\
             # TYPE gantry_switch_success_total counter\n\
             gantry_switch_success_total {}\n\
             # HELP gantry_switch_partial_total Partially acknowledged switch commands.\n\
             # TYPE gantry_switch_partial_total counter\n\
             gantry_switch_partial_total {}\n\
             # HELP gantry_switch_failure_total Unacknowledged switch commands.\n\
             # TYPE gantry_switch_failure_total counter\n\
             gantry_switch_failure_total {}\n\
             # HELP gantry_busy_rejections_total Switch requests rejected on a held GPU lock.\n\
             # TYPE gantry_busy_rejections_total counter\n\
             gantry_busy_rejections_total {}\n",
            self.cycles_total.load(Ordering::Relaxed),
            self.cycle_errors_total.load(Ordering::Relaxed),
            self.discovery_failures_total.load(Ordering::Relaxed),
            self.ticks_dropped_total.load(Ordering::Relaxed),
            self.switch_success_total.load(Ordering::Relaxed),
            self.switch_partial_total.load(Ordering::Relaxed),
            self.switch_failure_total.load(Ordering::Relaxed),
            self.busy_rejections_total.load(Ordering::Relaxed),
        )
    }
}
