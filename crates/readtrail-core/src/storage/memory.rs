use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{matches_index, KeyValueStore, RecordKey, StorageError, StoredRecord};

/// One named collection: records in key order plus the next key to hand out.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Collection {
    next_key: RecordKey,
    records: BTreeMap<RecordKey, Value>,
}

impl Collection {
    pub(crate) fn records(&self) -> Vec<StoredRecord> {
        self.records
            .iter()
            .map(|(key, value)| StoredRecord {
                key: *key,
                value: value.clone(),
            })
            .collect()
    }

    pub(crate) fn find(&self, index: &str, value: &str) -> Option<StoredRecord> {
        self.records
            .iter()
            .find(|(_, record)| matches_index(record, index, value))
            .map(|(key, record)| StoredRecord {
                key: *key,
                value: record.clone(),
            })
    }

    pub(crate) fn insert(&mut self, value: Value) -> RecordKey {
        self.next_key += 1;
        let key = self.next_key;
        self.records.insert(key, value);
        key
    }

    pub(crate) fn update(
        &mut self,
        store: &str,
        key: RecordKey,
        value: Value,
    ) -> Result<(), StorageError> {
        match self.records.get_mut(&key) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(StorageError::UnknownRecord {
                store: store.to_string(),
                key,
            }),
        }
    }

    pub(crate) fn remove(&mut self, key: RecordKey) {
        self.records.remove(&key);
    }

    pub(crate) fn clear(&mut self) {
        self.records.clear();
    }

    /// Fresh content that keeps counting keys from where this one stopped.
    pub(crate) fn replaced_with(&self, values: Vec<Value>) -> (Collection, Vec<RecordKey>) {
        let mut next = Collection {
            next_key: self.next_key,
            records: BTreeMap::new(),
        };
        let keys = values.into_iter().map(|value| next.insert(value)).collect();
        (next, keys)
    }
}

/// Store engine living in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(
        &self,
        f: impl FnOnce(&HashMap<String, Collection>) -> T,
    ) -> Result<T, StorageError> {
        let guard = self
            .collections
            .read()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".to_string()))?;
        Ok(f(&guard))
    }

    fn write<T>(
        &self,
        store: &str,
        f: impl FnOnce(&mut Collection) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut guard = self
            .collections
            .write()
            .map_err(|_| StorageError::Backend("memory store lock poisoned".to_string()))?;
        f(guard.entry(store.to_string()).or_default())
    }
}

impl KeyValueStore for MemoryStore {
    async fn get_all(&self, store: &str) -> Result<Vec<StoredRecord>, StorageError> {
        self.read(|collections| {
            collections
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
        self.read(|collections| collections.get(store).and_then(|c| c.find(index, value)))
    }

    async fn add(&self, store: &str, value: Value) -> Result<RecordKey, StorageError> {
        self.write(store, |collection| Ok(collection.insert(value)))
    }

    async fn update(&self, store: &str, key: RecordKey, value: Value) -> Result<(), StorageError> {
        self.write(store, |collection| collection.update(store, key, value))
    }

    async fn delete(&self, store: &str, key: RecordKey) -> Result<(), StorageError> {
        self.write(store, |collection| {
            collection.remove(key);
            Ok(())
        })
    }

    async fn clear_store(&self, store: &str) -> Result<(), StorageError> {
        self.write(store, |collection| {
            collection.clear();
            Ok(())
        })
    }

    async fn replace_all(
        &self,
        store: &str,
        values: Vec<Value>,
    ) -> Result<Vec<RecordKey>, StorageError> {
        self.write(store, |collection| {
            let (next, keys) = collection.replaced_with(values);
            *collection = next;
            Ok(keys)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_get_update_delete() {
        let store = MemoryStore::new();
        let key = store
            .add("things", json!({"path": "a", "n": 1}))
            .await
            .unwrap();
        store.add("things", json!({"path": "b", "n": 2})).await.unwrap();

        let found = store
            .get_by_index("things", "path", "a")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.key, key);
        assert_eq!(found.value["n"], 1);

        store
            .update("things", key, json!({"path": "a", "n": 10}))
            .await
            .unwrap();
        let all = store.get_all("things").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].value["n"], 10);

        store.delete("things", key).await.unwrap();
        assert!(store
            .get_by_index("things", "path", "a")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_update_unknown_key_fails() {
        let store = MemoryStore::new();
        let err = store.update("things", 42, json!({})).await.unwrap_err();
        assert!(matches!(err, StorageError::UnknownRecord { key: 42, .. }));
    }

    #[tokio::test]
    async fn test_unwritten_store_is_empty() {
        let store = MemoryStore::new();
        assert!(store.get_all("nothing").await.unwrap().is_empty());
        assert!(store
            .get_by_index("nothing", "path", "x")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_replace_all_swaps_content_with_fresh_keys() {
        let store = MemoryStore::new();
        let old = store.add("things", json!({"path": "old"})).await.unwrap();

        let keys = store
            .replace_all("things", vec![json!({"path": "x"}), json!({"path": "y"})])
            .await
            .unwrap();

        assert_eq!(keys.len(), 2);
        assert!(keys.iter().all(|k| *k > old));
        let all = store.get_all("things").await.unwrap();
        let paths: Vec<&str> = all.iter().filter_map(|r| r.value["path"].as_str()).collect();
        assert_eq!(paths, vec!["x", "y"]);
    }

    #[tokio::test]
    async fn test_clear_store_keeps_other_collections() {
        let store = MemoryStore::new();
        store.add("a", json!({"v": 1})).await.unwrap();
        store.add("b", json!({"v": 2})).await.unwrap();
        store.clear_store("a").await.unwrap();
        assert!(store.get_all("a").await.unwrap().is_empty());
        assert_eq!(store.get_all("b").await.unwrap().len(), 1);
    }
}
