//! Blob storage behind the text endpoints.
//!
//! Stores are synchronous; the HTTP handlers call them on tokio's blocking
//! pool.

use std::collections::HashMap;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

use bytes::Bytes;
use parking_lot::RwLock;

use crate::error::StoreError;

/// Directory used when `OSS_DIRECTORY` is not set.
pub const DEFAULT_DIRECTORY: &str = "3dtext";

/// Name of the stored object inside the directory.
pub const OBJECT_NAME: &str = "content.txt";

/// Object key for the text blob: `<directory>/content.txt`.
///
/// An empty directory falls back to [`DEFAULT_DIRECTORY`].
pub fn object_key(directory: &str) -> String {
    let directory = directory.trim_matches('/');
    let directory = if directory.is_empty() { DEFAULT_DIRECTORY } else { directory };
    format!("{directory}/{OBJECT_NAME}")
}

/// Key/value blob storage within one bucket.
pub trait ObjectStore: Send + Sync + 'static {
    fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError>;

    fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), StoreError>;
}

/// In-process store, lost on restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<(String, String), Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ObjectStore for MemoryStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        self.objects
            .read()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{bucket}/{key}")))
    }

    fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), StoreError> {
        self.objects
            .write()
            .insert((bucket.to_string(), key.to_string()), data);
        Ok(())
    }
}

/// Store that keeps each object at `<root>/<bucket>/<key>`.
#[derive(Debug, Clone)]
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File path for an object. Keys may not leave the bucket directory.
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf, StoreError> {
        let relative = Path::new(bucket).join(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if escapes || bucket.is_empty() || key.is_empty() {
            return Err(StoreError::NotFound(format!("{bucket}/{key}")));
        }
        Ok(self.root.join(relative))
    }
}

impl ObjectStore for FsStore {
    fn get(&self, bucket: &str, key: &str) -> Result<Bytes, StoreError> {
        let path = self.object_path(bucket, key)?;
        match std::fs::read(&path) {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(format!("{bucket}/{key}")))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn put(&self, bucket: &str, key: &str, data: Bytes) -> Result<(), StoreError> {
        let path = self.object_path(bucket, key)?;
        let parent = path.parent().unwrap_or(&self.root);
        std::fs::create_dir_all(parent)?;
        // Each write gets its own temp file, renamed over the object when complete
        let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
        tmp.write_all(&data)?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key() {
        assert_eq!(object_key("3dtext"), "3dtext/content.txt");
        assert_eq!(object_key("notes/"), "notes/content.txt");
        assert_eq!(object_key(""), "3dtext/content.txt");
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(matches!(store.get("b", "k"), Err(StoreError::NotFound(_))));

        store.put("b", "k", Bytes::from_static(b"one")).unwrap();
        store.put("b", "k", Bytes::from_static(b"two")).unwrap();
        assert_eq!(store.get("b", "k").unwrap(), Bytes::from_static(b"two"));
        // Buckets are separate
        assert!(store.get("other", "k").is_err());
    }

    #[test]
    fn test_fs_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        let key = object_key("3dtext");

        assert!(matches!(store.get("bucket", &key), Err(StoreError::NotFound(_))));
        store.put("bucket", &key, Bytes::from("你好\nRust")).unwrap();
        assert_eq!(store.get("bucket", &key).unwrap(), Bytes::from("你好\nRust"));
        assert!(dir.path().join("bucket/3dtext/content.txt").exists());
    }

    #[test]
    fn test_fs_store_concurrent_puts() {
        let dir = tempfile::tempdir().unwrap();
        let store = std::sync::Arc::new(FsStore::new(dir.path()));
        let key = object_key("3dtext");
        let values = [Bytes::from("first writer"), Bytes::from("second writer")];

        for _ in 0..100 {
            let handles: Vec<_> = values
                .iter()
                .cloned()
                .map(|data| {
                    let store = store.clone();
                    let key = key.clone();
                    std::thread::spawn(move || store.put("bucket", &key, data))
                })
                .collect();
            for handle in handles {
                handle.join().unwrap().unwrap();
            }
            let stored = store.get("bucket", &key).unwrap();
            assert!(values.contains(&stored));
        }

        // No temp files left behind
        let entries = std::fs::read_dir(dir.path().join("bucket/3dtext")).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_fs_store_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        assert!(store.put("bucket", "../outside.txt", Bytes::new()).is_err());
        assert!(store.put("..", "x.txt", Bytes::new()).is_err());
        assert!(store.get("bucket", "/etc/passwd").is_err());
    }
}
