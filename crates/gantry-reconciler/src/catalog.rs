use std::collections::{BTreeSet, HashMap};

/// Effective available-model set for a node: the union of what was already
/// known and the key set of a freshly discovered supported-model catalog
/// (model name → backend type; the backend type is irrelevant here).
///
/// Pure and idempotent: merging the same catalog twice yields the same set
/// as merging it once. Callers skip the merge entirely for nodes whose
/// discovery call failed.
pub fn merge_models(
    existing: &BTreeSet<String>,
    discovered: &HashMap<String, String>,
) -> BTreeSet<String> {
    let mut merged = existing.clone();
    merged.extend(discovered.keys().cloned());
    merged
}
