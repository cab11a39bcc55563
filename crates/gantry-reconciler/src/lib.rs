pub mod catalog;
pub mod executor;
pub mod lock;
pub mod metrics;
pub mod scheduler;
pub mod snapshot;
pub mod sources;
pub mod util;

pub use executor::{CommandExecutor, SwitchRequest};
pub use lock::{PlacementGuard, PlacementLocks};
pub use metrics::SharedMetrics;
pub use scheduler::{ObserverGuard, PollOutcome, ReconcileScheduler, SchedulerConfig, SchedulerHandle};
pub use snapshot::SnapshotBuilder;
pub use sources::{CatalogDiscovery, HttpStatusSource, PlacementCommands, StatusSource};
