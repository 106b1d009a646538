pub mod domain;
pub mod store;

pub use domain::{MeterRecord, SnapshotRef};
pub use store::{FsObjectStore, InMemoryObjectStore, ObjectStore, StoreError};
