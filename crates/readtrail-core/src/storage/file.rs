use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::memory::Collection;
use super::{KeyValueStore, RecordKey, StorageError, StoredRecord};
use crate::vfs::FileSystem;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    #[serde(default)]
    collections: BTreeMap<String, Collection>,
}

impl Snapshot {
    const CURRENT_VERSION: u32 = 1;

    fn empty() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            collections: BTreeMap::new(),
        }
    }
}

/// Store engine persisting every collection into one JSON file.
///
/// The snapshot stays in memory; each mutation is applied to a copy, written
/// through [`FileSystem::write_all`] and only then committed, so a failed
/// write leaves both the file and the in-memory state unchanged.
///
/// Mutations write the file synchronously while holding a lock. Callers
/// sharing one store across tasks of a multi-threaded runtime should run
/// those calls through `tokio::task::spawn_blocking`.
pub struct JsonFileStore {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
    snapshot: Mutex<Snapshot>,
}

impl JsonFileStore {
    /// Open the store at `path`, starting empty when the file does not exist.
    pub fn open(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Result<Self, StorageError> {
        let path = path.into();
        let snapshot = if fs.exists(&path) {
            let buffer = fs.read_all(&path)?;
            let snapshot: Snapshot = serde_json::from_slice(&buffer)?;
            if snapshot.version != Snapshot::CURRENT_VERSION {
                return Err(StorageError::Corrupt(format!(
                    "unsupported snapshot version {}",
                    snapshot.version
                )));
            }
            snapshot
        } else {
            Snapshot::empty()
        };

        log::debug!(
            "opened store file {:?} with {} collections",
            path,
            snapshot.collections.len()
        );

        Ok(Self {
            path,
            fs,
            snapshot: Mutex::new(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> Result<T, StorageError> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|_| StorageError::Backend("file store lock poisoned".to_string()))?;
        Ok(f(&guard))
    }

    fn mutate<T>(
        &self,
        store: &str,
        f: impl FnOnce(&mut Collection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|_| StorageError::Backend("file store lock poisoned".to_string()))?;

        let mut staged = guard.clone();
        let result = f(staged.collections.entry(store.to_string()).or_default())?;

        let buffer = serde_json::to_vec_pretty(&staged)?;
        self.fs.write_all(&self.path, &buffer)?;
        *guard = staged;
        Ok(result)
    }
}

impl KeyValueStore for JsonFileStore {
    async fn get_all(&self, store: &str) -> Result<Vec<StoredRecord>, StorageError> {
        self.read(|snapshot| {
            snapshot
                .collections
                .get(store)
                .map(Collection::records)
                .unwrap_or_default()
        })
    }

    async fn get_by_index(
        &self,
        store: &str,
        index: &str,
        value: &str,
    ) -> Result<Option<StoredRecord>, StorageError> {
        self.read(|snapshot| {
            snapshot
                .collections
                .get(store)
                .and_then(|c| c.find(index, value))
        })
    }

    async fn add(&self, store: &str, value: Value) -> Result<RecordKey, StorageError> {
        self.mutate(store, |collection| Ok(collection.insert(value)))
    }

    async fn update(&self, store: &str, key: RecordKey, value: Value) -> Result<(), StorageError> {
        self.mutate(store, |collection| collection.update(store, key, value))
    }

    async fn delete(&self, store: &str, key: RecordKey) -> Result<(), StorageError> {
        self.mutate(store, |collection| {
            collection.remove(key);
            Ok(())
        })
    }

    async fn clear_store(&self, store: &str) -> Result<(), StorageError> {
        self.mutate(store, |collection| {
            collection.clear();
            Ok(())
        })
    }

    async fn replace_all(
        &self,
        store: &str,
        values: Vec<Value>,
    ) -> Result<Vec<RecordKey>, StorageError> {
        self.mutate(store, |collection| {
            let (next, keys) = collection.replaced_with(values);
            *collection = next;
            Ok(keys)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::PhysicalFileSystem;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("state/store.json");
        let fs: Arc<dyn FileSystem> = Arc::new(PhysicalFileSystem);

        let store = JsonFileStore::open(&path, fs.clone()).unwrap();
        let key = store
            .add("readingHistory", json!({"path": "a"}))
            .await
            .unwrap();
        store
            .update("readingHistory", key, json!({"path": "a", "readCount": 2}))
            .await
            .unwrap();
        drop(store);

        let reopened = JsonFileStore::open(&path, fs).unwrap();
        let record = reopened
            .get_by_index("readingHistory", "path", "a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.key, key);
        assert_eq!(record.value["readCount"], 2);

        // keys keep counting after reopen
        let next = reopened
            .add("readingHistory", json!({"path": "b"}))
            .await
            .unwrap();
        assert!(next > key);
    }

    #[tokio::test]
    async fn test_failed_update_leaves_state_untouched() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        let store = JsonFileStore::open(&path, Arc::new(PhysicalFileSystem)).unwrap();
        store.add("s", json!({"path": "a"})).await.unwrap();

        assert!(store.update("s", 999, json!({"path": "z"})).await.is_err());
        let all = store.get_all("s").await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].value["path"], "a");
    }

    #[test]
    fn test_rejects_unknown_version() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("store.json");
        std::fs::write(&path, r#"{"version": 99, "collections": {}}"#).unwrap();
        let result = JsonFileStore::open(&path, Arc::new(PhysicalFileSystem));
        assert!(matches!(result, Err(StorageError::Corrupt(_))));
    }
}
