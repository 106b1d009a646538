use billing_client::{domain::SnapshotRef, ObjectStore};

use crate::pipeline::PipelineError;

/// Pick the snapshot with the greatest `last_modified`.
///
/// Ties on `last_modified` go to the lexicographically greatest key, so the
/// choice never depends on listing order.
pub fn select_latest(candidates: Vec<SnapshotRef>) -> Option<SnapshotRef> {
    candidates
        .into_iter()
        .max_by(|a, b| {
            a.last_modified
                .cmp(&b.last_modified)
                .then_with(|| a.key.cmp(&b.key))
        })
}

/// List `prefix` and return the most recent snapshot.
///
/// Always re-lists; new snapshots may have landed since the last call.
pub async fn latest_snapshot(store: &dyn ObjectStore, prefix: &str) -> Result<SnapshotRef, PipelineError> {
    let candidates = store.list(prefix).await?;
    tracing::debug!(prefix, candidates = candidates.len(), "listed snapshots");

    select_latest(candidates)
        .ok_or_else(|| PipelineError::NotFound(format!("No billing files found under prefix '{prefix}'")))
}
