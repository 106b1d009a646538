use std::collections::BTreeMap;

use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{ObjectStore, StoreError};
use crate::domain::SnapshotRef;

struct StoredObject {
    body: Vec<u8>,
    last_modified: OffsetDateTime,
}

/// Object store kept entirely in memory. Keys list in lexicographic order.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<BTreeMap<String, StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an object.
    pub async fn put(&self, key: impl Into<String>, body: impl Into<Vec<u8>>, last_modified: OffsetDateTime) {
        self.objects.write().await.insert(
            key.into(),
            StoredObject {
                body: body.into(),
                last_modified,
            },
        );
    }
}

#[async_trait::async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<SnapshotRef>, StoreError> {
        let objects = self.objects.read().await;
        Ok(objects
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, obj)| SnapshotRef::new(key.clone(), obj.last_modified))
            .collect())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        self.objects
            .read()
            .await
            .get(key)
            .map(|obj| obj.body.clone())
            .ok_or_else(|| StoreError::NotFound(format!("no object with key '{key}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[tokio::test]
    async fn list_filters_by_raw_prefix() {
        let store = InMemoryObjectStore::new();
        store.put("data/billing_agg_1.csv", "a", datetime!(2025-01-01 00:00:00 UTC)).await;
        store.put("data/billing_agg_2.csv", "b", datetime!(2025-01-02 00:00:00 UTC)).await;
        store.put("data/other.csv", "c", datetime!(2025-01-03 00:00:00 UTC)).await;

        let listed = store.list("data/billing_agg").await.unwrap();
        let keys: Vec<_> = listed.iter().map(|s| s.key.as_str()).collect();
        assert_eq!(keys, vec!["data/billing_agg_1.csv", "data/billing_agg_2.csv"]);
    }

    #[tokio::test]
    async fn get_missing_key_is_not_found() {
        let store = InMemoryObjectStore::new();
        let res = store.get("nope").await;
        assert!(matches!(res, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn put_replaces_existing_object() {
        let store = InMemoryObjectStore::new();
        store.put("k", "old", datetime!(2025-01-01 00:00:00 UTC)).await;
        store.put("k", "new", datetime!(2025-02-01 00:00:00 UTC)).await;

        assert_eq!(store.get("k").await.unwrap(), b"new".to_vec());
        let listed = store.list("").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].last_modified, datetime!(2025-02-01 00:00:00 UTC));
    }
}
