//! Access to the object store holding dataset snapshots.

pub mod fs;
pub mod memory;

pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;

use crate::domain::SnapshotRef;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// The bucket, prefix root or key does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    #[error("store I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Io(e.to_string())
    }
}

/// Read-only view of a bucket of snapshots.
///
/// `list` follows object-store prefix semantics: a key matches when it starts
/// with `prefix`, regardless of any `/` separators.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    async fn list(&self, prefix: &str) -> Result<Vec<SnapshotRef>, StoreError>;

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError>;
}
