use serde::{Deserialize, Serialize};

/// Scheduling-strategy configuration record. Pure reference data: the live
/// system only supports explicit operator-triggered start/stop, so no
/// strategy carries executable behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SchedulingStrategy {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active: bool,
}
