use std::{
    io::ErrorKind,
    path::{Component, Path, PathBuf},
};

use time::OffsetDateTime;

use super::{ObjectStore, StoreError};
use crate::domain::SnapshotRef;

/// Directory-backed object store.
///
/// The root directory plays the role of the bucket. Keys are file paths
/// relative to the root, always `/`-separated, and `last_modified` is the
/// file's modification time.
pub struct FsObjectStore {
    root: PathBuf,
}

impl FsObjectStore {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(key);
        // Keys must stay inside the root.
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(StoreError::NotFound(format!("invalid key '{key}'")));
        }
        Ok(self.root.join(rel))
    }
}

fn key_for(root: &Path, path: &Path) -> Option<String> {
    let rel = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = rel
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

#[async_trait::async_trait]
impl ObjectStore for FsObjectStore {
    async fn list(&self, prefix: &str) -> Result<Vec<SnapshotRef>, StoreError> {
        match tokio::fs::metadata(&self.root).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(StoreError::NotFound(format!(
                    "store root {} is not a directory",
                    self.root.display()
                )))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(format!(
                    "store root {} does not exist",
                    self.root.display()
                )))
            }
            Err(e) => return Err(e.into()),
        }

        let mut found = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = tokio::fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let path = entry.path();
                let meta = entry.metadata().await?;
                if meta.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Some(key) = key_for(&self.root, &path) else {
                    tracing::debug!(path = %path.display(), "skipping non UTF-8 path");
                    continue;
                };
                if !key.starts_with(prefix) {
                    continue;
                }

                let last_modified = OffsetDateTime::from(meta.modified()?);
                found.push(SnapshotRef::new(key, last_modified));
            }
        }

        found.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(found)
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(format!("no object with key '{key}'")))
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_nested_files_with_slash_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(dir.path().join("data/billing_agg_2025-09.csv"), "Date\n").unwrap();
        std::fs::write(dir.path().join("data/readme.txt"), "x").unwrap();
        std::fs::write(dir.path().join("top.csv"), "x").unwrap();

        let store = FsObjectStore::new(dir.path());
        let listed = store.list("data/billing_agg").await.unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "data/billing_agg_2025-09.csv");
    }

    #[tokio::test]
    async fn missing_root_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsObjectStore::new(dir.path().join("absent"));

        let res = store.list("").await;
        assert!(matches!(res, Err(StoreError::NotFound(_))));
    }

    #[tokio::test]
    async fn get_reads_bytes_and_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.csv"), "hello").unwrap();
        let store = FsObjectStore::new(dir.path());

        assert_eq!(store.get("a.csv").await.unwrap(), b"hello".to_vec());
        assert!(matches!(store.get("b.csv").await, Err(StoreError::NotFound(_))));
        assert!(matches!(store.get("../a.csv").await, Err(StoreError::NotFound(_))));
    }
}
