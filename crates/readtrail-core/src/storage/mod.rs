//! Key/value storage collaborator used by the reading stores.
//!
//! A store engine holds named collections of JSON records. Each record gets
//! an engine-assigned [`RecordKey`]; secondary lookups go through
//! [`KeyValueStore::get_by_index`] on a top-level string field.

use std::future::Future;
use std::sync::Arc;

use serde_json::Value;

pub use crate::error::StorageError;

mod file;
mod memory;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

pub type RecordKey = u64;

/// Collection holding [`crate::model::ReadingHistoryItem`] records, indexed by `path`
pub const READING_HISTORY_STORE: &str = "readingHistory";
/// Collection holding [`crate::model::ReadingTodoItem`] records, indexed by `id`
pub const READING_LIST_STORE: &str = "readingLists";

#[derive(Debug, Clone, PartialEq)]
pub struct StoredRecord {
    pub key: RecordKey,
    pub value: Value,
}

/// Asynchronous storage engine.
///
/// Operations are independent: there is no transaction spanning two calls.
/// `replace_all` is the only multi-record write and must be atomic.
pub trait KeyValueStore: Send + Sync {
    /// Every record of `store`, in key order. A store never written is empty.
    fn get_all(
        &self,
        store: &str,
    ) -> impl Future<Output = Result<Vec<StoredRecord>, StorageError>> + Send;

    /// First record whose string field `index` equals `value`.
    fn get_by_index(
        &self,
        store: &str,
        index: &str,
        value: &str,
    ) -> impl Future<Output = Result<Option<StoredRecord>, StorageError>> + Send;

    fn add(
        &self,
        store: &str,
        value: Value,
    ) -> impl Future<Output = Result<RecordKey, StorageError>> + Send;

    /// Overwrite an existing record. Fails with [`StorageError::UnknownRecord`]
    /// if `key` is not present.
    fn update(
        &self,
        store: &str,
        key: RecordKey,
        value: Value,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Remove a record. Deleting a missing key succeeds.
    fn delete(
        &self,
        store: &str,
        key: RecordKey,
    ) -> impl Future<Output = Result<(), StorageError>> + Send;

    fn clear_store(&self, store: &str) -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Swap the whole content of `store` for `values` in one step. On error
    /// the previous content is left untouched.
    fn replace_all(
        &self,
        store: &str,
        values: Vec<Value>,
    ) -> impl Future<Output = Result<Vec<RecordKey>, StorageError>> + Send;
}

impl<S: KeyValueStore> KeyValueStore for Arc<S> {
    fn get_all(
        &self,
        store: &str,
    ) -> impl Future<Output = Result<Vec<StoredRecord>, StorageError>> + Send {
        (**self).get_all(store)
    }

    fn get_by_index(
        &self,
        store: &str,
        index: &str,
        value: &str,
    ) -> impl Future<Output = Result<Option<StoredRecord>, StorageError>> + Send {
        (**self).get_by_index(store, index, value)
    }

    fn add(
        &self,
        store: &str,
        value: Value,
    ) -> impl Future<Output = Result<RecordKey, StorageError>> + Send {
        (**self).add(store, value)
    }

    fn update(
        &self,
        store: &str,
        key: RecordKey,
        value: Value,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).update(store, key, value)
    }

    fn delete(
        &self,
        store: &str,
        key: RecordKey,
    ) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).delete(store, key)
    }

    fn clear_store(&self, store: &str) -> impl Future<Output = Result<(), StorageError>> + Send {
        (**self).clear_store(store)
    }

    fn replace_all(
        &self,
        store: &str,
        values: Vec<Value>,
    ) -> impl Future<Output = Result<Vec<RecordKey>, StorageError>> + Send {
        (**self).replace_all(store, values)
    }
}

/// Whether `record` carries the string `value` in its top-level field `index`.
pub(crate) fn matches_index(record: &Value, index: &str, value: &str) -> bool {
    record.get(index).and_then(Value::as_str) == Some(value)
}
