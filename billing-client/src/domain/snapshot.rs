use time::OffsetDateTime;

/// A dataset snapshot as listed by the object store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotRef {
    pub key: String,
    pub last_modified: OffsetDateTime,
}

impl SnapshotRef {
    pub fn new(key: impl Into<String>, last_modified: OffsetDateTime) -> Self {
        Self {
            key: key.into(),
            last_modified,
        }
    }
}
