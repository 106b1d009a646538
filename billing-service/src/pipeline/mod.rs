//! Shared load flow: pick the latest snapshot, fetch it, normalize it.
//!
//! Both invocation entry points run this flow and then hand the records to
//! their own engine.

use billing_client::{domain::SnapshotRef, store::StoreError, ObjectStore};

use crate::{
    sources,
    transform::{self, NormalizeOptions, NormalizedDataset},
};

#[derive(thiserror::Error, Debug)]
pub enum PipelineError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("schema error: {0}")]
    Schema(String),
    #[error("validation error: {0}")]
    Validation(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Human-readable message without the kind prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(m) | Self::Schema(m) | Self::Validation(m) | Self::Internal(m) => m,
        }
    }
}

impl From<StoreError> for PipelineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(m) => PipelineError::NotFound(m),
            StoreError::Io(m) => PipelineError::Internal(m),
        }
    }
}

/// A normalized dataset together with the snapshot it came from.
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub snapshot: SnapshotRef,
    pub dataset: NormalizedDataset,
}

pub async fn load_latest_dataset(
    store: &dyn ObjectStore,
    prefix: &str,
    options: &NormalizeOptions,
) -> Result<LoadedDataset, PipelineError> {
    let snapshot = sources::latest_snapshot(store, prefix).await?;
    tracing::info!(key = %snapshot.key, last_modified = %snapshot.last_modified, "latest snapshot selected");

    let raw = store.get(&snapshot.key).await?;
    let dataset = transform::normalize(&raw, options)?;

    tracing::info!(
        key = %snapshot.key,
        records = dataset.records.len(),
        dropped_rows = dataset.dropped_rows,
        coerced_cells = dataset.coerced_cells,
        "snapshot normalized"
    );

    Ok(LoadedDataset { snapshot, dataset })
}
