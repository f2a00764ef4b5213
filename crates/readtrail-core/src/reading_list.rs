//! To-read queue, independent of section-level progress.

use crate::error::StorageError;
use crate::model::{CompletionStats, ReadingTodoItem};
use crate::storage::{KeyValueStore, StoredRecord, READING_LIST_STORE};
use crate::utils::{id::generate_id, normalize_document_path, time};

const ID_INDEX: &str = "id";

pub struct ReadingList<S> {
    store: S,
}

impl<S: KeyValueStore> ReadingList<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Queue a document under the path as given. Returns `false` if a path
    /// with the same normalized form is already queued or the store failed.
    pub async fn add_to_reading_list(&self, path: &str, title: &str) -> bool {
        self.add(path, title).await.unwrap_or_else(|err| {
            log::error!("failed to add {path:?} to reading list: {err}");
            false
        })
    }

    async fn add(&self, path: &str, title: &str) -> Result<bool, StorageError> {
        if self.find_by_path(path).await?.is_some() {
            return Ok(false);
        }

        let item = ReadingTodoItem {
            id: generate_id(),
            path: path.to_string(),
            title: title.to_string(),
            added_at: time::now(),
            completed: false,
            completed_at: None,
        };
        self.store
            .add(READING_LIST_STORE, serde_json::to_value(&item)?)
            .await?;
        Ok(true)
    }

    /// Flip the completion flag of an entry, stamping or clearing
    /// `completed_at`. Returns the updated entry.
    pub async fn toggle_completion(&self, id: &str) -> Option<ReadingTodoItem> {
        match self.toggle(id).await {
            Ok(item) => item,
            Err(err) => {
                log::error!("failed to toggle reading list entry {id:?}: {err}");
                None
            }
        }
    }

    async fn toggle(&self, id: &str) -> Result<Option<ReadingTodoItem>, StorageError> {
        let Some((record, mut item)) = self.find_by_id(id).await? else {
            return Ok(None);
        };
        item.completed = !item.completed;
        item.completed_at = item.completed.then(time::now);
        self.store
            .update(READING_LIST_STORE, record.key, serde_json::to_value(&item)?)
            .await?;
        Ok(Some(item))
    }

    /// Entries, most recently added first.
    pub async fn get_reading_list(&self) -> Vec<ReadingTodoItem> {
        match self.all_items().await {
            Ok(mut items) => {
                items.sort_by(|a, b| b.added_at.cmp(&a.added_at));
                items
            }
            Err(err) => {
                log::error!("failed to list reading list: {err}");
                Vec::new()
            }
        }
    }

    pub async fn get_completion_stats(&self) -> CompletionStats {
        match self.all_items().await {
            Ok(items) => completion_stats(&items),
            Err(err) => {
                log::error!("failed to compute reading list stats: {err}");
                CompletionStats::default()
            }
        }
    }

    pub async fn is_in_reading_list(&self, path: &str) -> bool {
        match self.find_by_path(path).await {
            Ok(found) => found.is_some(),
            Err(err) => {
                log::error!("failed to look up {path:?} in reading list: {err}");
                false
            }
        }
    }

    pub async fn remove_from_reading_list(&self, id: &str) -> bool {
        match self.remove(id).await {
            Ok(removed) => removed,
            Err(err) => {
                log::error!("failed to remove reading list entry {id:?}: {err}");
                false
            }
        }
    }

    async fn remove(&self, id: &str) -> Result<bool, StorageError> {
        let Some((record, _)) = self.find_by_id(id).await? else {
            return Ok(false);
        };
        self.store.delete(READING_LIST_STORE, record.key).await?;
        Ok(true)
    }

    /// Remove every completed entry, returning how many were dropped.
    pub async fn clear_completed(&self) -> usize {
        match self.remove_completed().await {
            Ok(count) => count,
            Err(err) => {
                log::error!("failed to clear completed reading list entries: {err}");
                0
            }
        }
    }

    async fn remove_completed(&self) -> Result<usize, StorageError> {
        let mut removed = 0;
        for record in self.store.get_all(READING_LIST_STORE).await? {
            let item: ReadingTodoItem = serde_json::from_value(record.value)?;
            if item.completed {
                self.store.delete(READING_LIST_STORE, record.key).await?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn find_by_id(
        &self,
        id: &str,
    ) -> Result<Option<(StoredRecord, ReadingTodoItem)>, StorageError> {
        let Some(record) = self
            .store
            .get_by_index(READING_LIST_STORE, ID_INDEX, id)
            .await?
        else {
            return Ok(None);
        };
        let item = serde_json::from_value(record.value.clone())?;
        Ok(Some((record, item)))
    }

    /// Entry whose path normalizes to the same key as `path`.
    async fn find_by_path(&self, path: &str) -> Result<Option<ReadingTodoItem>, StorageError> {
        let key = normalize_document_path(path);
        Ok(self
            .all_items()
            .await?
            .into_iter()
            .find(|item| normalize_document_path(&item.path) == key))
    }

    async fn all_items(&self) -> Result<Vec<ReadingTodoItem>, StorageError> {
        self.store
            .get_all(READING_LIST_STORE)
            .await?
            .into_iter()
            .map(|record| serde_json::from_value(record.value).map_err(StorageError::from))
            .collect()
    }
}

/// Aggregate over a list snapshot; the percentage is 0 for an empty list.
pub fn completion_stats(items: &[ReadingTodoItem]) -> CompletionStats {
    let total = items.len();
    let completed = items.iter().filter(|item| item.completed).count();
    let completion_percentage = if total == 0 {
        0
    } else {
        ((completed as f64 / total as f64) * 100.0).round() as u32
    };

    CompletionStats {
        total,
        completed,
        pending: total - completed,
        completion_percentage,
    }
}
