use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use gantry_common::ReconcileError;

/// Per-GPU mutual exclusion for switch sequences, keyed by
/// `(node_id, gpu_id)`.
///
/// Acquisition is non-blocking: if the slot is already held the caller gets
/// `PlacementBusy` immediately. Requests are never queued; a switch that
/// waited behind another would run with a stale "model to stop".
#[derive(Clone, Default)]
pub struct PlacementLocks {
    held: Arc<DashMap<(i64, u32), ()>>,
}

/// Holds the `(node_id, gpu_id)` slot for the lifetime of one switch
/// sequence. Released on drop.
pub struct PlacementGuard {
    key: (i64, u32),
    table: Arc<DashMap<(i64, u32), ()>>,
}

impl Drop for PlacementGuard {
    fn drop(&mut self) {
        self.table.remove(&self.key);
    }
}

impl PlacementLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn acquire(&self, node_id: i64, gpu_id: u32) -> Result<PlacementGuard, ReconcileError> {
        match self.held.entry((node_id, gpu_id)) {
            Entry::Occupied(_) => Err(ReconcileError::PlacementBusy { node_id, gpu_id }),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(PlacementGuard {
                    key: (node_id, gpu_id),
                    table: self.held.clone(),
                })
            }
        }
    }

    pub fn is_held(&self, node_id: i64, gpu_id: u32) -> bool {
        self.held.contains_key(&(node_id, gpu_id))
    }
}
