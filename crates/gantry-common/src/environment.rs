use serde::{Deserialize, Serialize};

/// Named grouping of nodes and models (e.g. a deployment tier). Owned by
/// the environment-registry CRUD collaborator.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Environment {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}
