//! Per-document reading history.
//!
//! One record per normalized document path holds the running totals of a
//! document: read count, time spent, words read and the set of completed
//! section indices. Totals only grow; the completed set only grows until
//! [`ReadingHistory::clear_reading_history`].

use std::collections::{BTreeSet, HashMap};

use crate::error::StorageError;
use crate::metrics::ReadingEstimator;
use crate::model::{DedupReport, ReadingHistoryItem, ReadingStats};
use crate::storage::{KeyValueStore, StoredRecord, READING_HISTORY_STORE};
use crate::utils::{normalize_document_path, time};

const PATH_INDEX: &str = "path";

pub struct ReadingHistory<S> {
    store: S,
    estimator: ReadingEstimator,
}

impl<S: KeyValueStore> ReadingHistory<S> {
    pub fn new(store: S) -> Self {
        Self::with_estimator(store, ReadingEstimator::default())
    }

    /// `estimator` fills in words read when a caller only reports time.
    pub fn with_estimator(store: S, estimator: ReadingEstimator) -> Self {
        Self { store, estimator }
    }

    /// Record a reading session for `path`.
    ///
    /// Creates the record on first read. Afterwards every call bumps the read
    /// count, adds the time and word deltas and unions `completed` into the
    /// stored indices. A missing `words_read` is estimated from `time_spent`.
    /// Returns `None` if the store failed.
    pub async fn add_to_reading_history(
        &self,
        path: &str,
        title: &str,
        completed: &[u32],
        time_spent: Option<u64>,
        words_read: Option<u64>,
    ) -> Option<ReadingHistoryItem> {
        match self
            .record_session(path, title, completed, time_spent, words_read)
            .await
        {
            Ok(item) => Some(item),
            Err(err) => {
                log::error!("failed to add {path:?} to reading history: {err}");
                None
            }
        }
    }

    async fn record_session(
        &self,
        path: &str,
        title: &str,
        completed: &[u32],
        time_spent: Option<u64>,
        words_read: Option<u64>,
    ) -> Result<ReadingHistoryItem, StorageError> {
        let path = normalize_document_path(path);
        let now = time::now();
        let time_delta = time_spent.unwrap_or(0);
        let words_delta = words_read.unwrap_or_else(|| self.estimator.words_read(time_delta));

        match self.find(&path).await? {
            Some((record, mut item)) => {
                item.read_count = item.read_count.saturating_add(1);
                item.time_spent = item.time_spent.saturating_add(time_delta);
                item.words_read = item.words_read.saturating_add(words_delta);
                item.last_read_at = now;
                if !title.trim().is_empty() {
                    item.title = title.to_string();
                }
                item.completed_section_indices =
                    union_indices(&item.completed_section_indices, completed);

                self.store
                    .update(READING_HISTORY_STORE, record.key, serde_json::to_value(&item)?)
                    .await?;
                Ok(item)
            }
            None => {
                let item = ReadingHistoryItem {
                    path,
                    title: title.to_string(),
                    last_read_at: now,
                    read_count: 1,
                    time_spent: time_delta,
                    words_read: words_delta,
                    completed_section_indices: union_indices(&[], completed),
                };
                self.store
                    .add(READING_HISTORY_STORE, serde_json::to_value(&item)?)
                    .await?;
                Ok(item)
            }
        }
    }

    /// Union `indices` into the completed set of an existing record.
    ///
    /// Returns `false` when the document has no history yet or the store
    /// failed.
    pub async fn mark_sections_completed(&self, path: &str, indices: &[u32]) -> bool {
        let path = normalize_document_path(path);
        self.complete_sections(&path, indices)
            .await
            .unwrap_or_else(|err| {
                log::error!("failed to mark sections of {path:?} completed: {err}");
                false
            })
    }

    async fn complete_sections(&self, path: &str, indices: &[u32]) -> Result<bool, StorageError> {
        let Some((record, mut item)) = self.find(path).await? else {
            return Ok(false);
        };
        item.completed_section_indices = union_indices(&item.completed_section_indices, indices);
        self.store
            .update(READING_HISTORY_STORE, record.key, serde_json::to_value(&item)?)
            .await?;
        Ok(true)
    }

    /// Merge records that share a normalized path.
    ///
    /// For every duplicated path the most recently read record is kept, its
    /// completed indices become the union of the group and its counters are
    /// raised to the group maximum. Stored paths are rewritten to their
    /// normalized form, lone records included. The repaired set replaces the
    /// store in a single [`KeyValueStore::replace_all`] call. Run it while no
    /// reading session is writing; errors are logged and returned.
    pub async fn clean_duplicate_history(&self) -> Result<DedupReport, StorageError> {
        self.deduplicate().await.map_err(|err| {
            log::error!("failed to clean duplicate reading history: {err}");
            err
        })
    }

    async fn deduplicate(&self) -> Result<DedupReport, StorageError> {
        let records = self.store.get_all(READING_HISTORY_STORE).await?;
        let original_count = records.len();

        let mut groups: Vec<Vec<ReadingHistoryItem>> = Vec::new();
        let mut group_of: HashMap<String, usize> = HashMap::new();
        for record in records {
            let item: ReadingHistoryItem =
                serde_json::from_value(record.value).map_err(|err| {
                    StorageError::Corrupt(format!("history record {}: {err}", record.key))
                })?;
            let key = normalize_document_path(&item.path);
            let slot = *group_of.entry(key).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[slot].push(item);
        }

        let all_normalized = groups
            .iter()
            .flatten()
            .all(|item| item.path == normalize_document_path(&item.path));
        if groups.len() == original_count && all_normalized {
            log::debug!("reading history has no duplicates ({original_count} records)");
            return Ok(DedupReport {
                removed_count: 0,
                total_count: original_count,
            });
        }

        let merged: Vec<ReadingHistoryItem> = groups.into_iter().filter_map(merge_group).collect();
        let values = merged
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        self.store.replace_all(READING_HISTORY_STORE, values).await?;

        let report = DedupReport {
            removed_count: original_count - merged.len(),
            total_count: merged.len(),
        };
        log::info!(
            "merged duplicate reading history: removed {}, kept {}",
            report.removed_count,
            report.total_count
        );
        Ok(report)
    }

    pub async fn get_history_item(&self, path: &str) -> Option<ReadingHistoryItem> {
        let path = normalize_document_path(path);
        match self.find(&path).await {
            Ok(found) => found.map(|(_, item)| item),
            Err(err) => {
                log::error!("failed to read history of {path:?}: {err}");
                None
            }
        }
    }

    /// History, most recently read first, capped at `limit` items.
    pub async fn get_reading_history(&self, limit: Option<usize>) -> Vec<ReadingHistoryItem> {
        let mut items = match self.all_items().await {
            Ok(items) => items,
            Err(err) => {
                log::error!("failed to list reading history: {err}");
                return Vec::new();
            }
        };
        items.sort_by(|a, b| b.last_read_at.cmp(&a.last_read_at));
        if let Some(limit) = limit {
            items.truncate(limit);
        }
        items
    }

    pub async fn remove_from_history(&self, path: &str) -> bool {
        let path = normalize_document_path(path);
        self.remove(&path).await.unwrap_or_else(|err| {
            log::error!("failed to remove {path:?} from reading history: {err}");
            false
        })
    }

    async fn remove(&self, path: &str) -> Result<bool, StorageError> {
        let Some((record, _)) = self.find(path).await? else {
            return Ok(false);
        };
        self.store.delete(READING_HISTORY_STORE, record.key).await?;
        Ok(true)
    }

    /// Drop every history record, including completed sections.
    pub async fn clear_reading_history(&self) -> bool {
        match self.store.clear_store(READING_HISTORY_STORE).await {
            Ok(()) => true,
            Err(err) => {
                log::error!("failed to clear reading history: {err}");
                false
            }
        }
    }

    pub async fn get_reading_stats(&self) -> ReadingStats {
        match self.all_items().await {
            Ok(items) => items.iter().fold(ReadingStats::default(), |mut stats, item| {
                stats.documents_read += 1;
                stats.total_read_count = stats.total_read_count.saturating_add(item.read_count);
                stats.total_time_spent = stats.total_time_spent.saturating_add(item.time_spent);
                stats.total_words_read = stats.total_words_read.saturating_add(item.words_read);
                stats.sections_completed += item.completed_section_indices.len();
                stats
            }),
            Err(err) => {
                log::error!("failed to compute reading stats: {err}");
                ReadingStats::default()
            }
        }
    }

    async fn find(
        &self,
        path: &str,
    ) -> Result<Option<(StoredRecord, ReadingHistoryItem)>, StorageError> {
        let Some(record) = self
            .store
            .get_by_index(READING_HISTORY_STORE, PATH_INDEX, path)
            .await?
        else {
            return Ok(None);
        };
        let item = serde_json::from_value(record.value.clone())?;
        Ok(Some((record, item)))
    }

    async fn all_items(&self) -> Result<Vec<ReadingHistoryItem>, StorageError> {
        self.store
            .get_all(READING_HISTORY_STORE)
            .await?
            .into_iter()
            .map(|record| serde_json::from_value(record.value).map_err(StorageError::from))
            .collect()
    }
}

fn union_indices(existing: &[u32], added: &[u32]) -> Vec<u32> {
    existing
        .iter()
        .chain(added)
        .copied()
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect()
}

fn merge_group(group: Vec<ReadingHistoryItem>) -> Option<ReadingHistoryItem> {
    if group.len() == 1 {
        return group.into_iter().next().map(|mut item| {
            item.path = normalize_document_path(&item.path);
            item
        });
    }

    let completed = group
        .iter()
        .flat_map(|item| item.completed_section_indices.iter().copied())
        .collect::<BTreeSet<u32>>();
    let read_count = group.iter().map(|i| i.read_count).max().unwrap_or(0);
    let time_spent = group.iter().map(|i| i.time_spent).max().unwrap_or(0);
    let words_read = group.iter().map(|i| i.words_read).max().unwrap_or(0);

    // max_by_key keeps the last maximum; iterate reversed so ties keep the first
    let mut base = group.into_iter().rev().max_by_key(|item| item.last_read_at)?;
    base.path = normalize_document_path(&base.path);
    base.completed_section_indices = completed.into_iter().collect();
    base.read_count = read_count;
    base.time_spent = time_spent;
    base.words_read = words_read;
    Some(base)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStore, RecordKey};
    use serde_json::{json, Value};
    use std::future::Future;
    use std::sync::Arc;

    fn history() -> ReadingHistory<Arc<MemoryStore>> {
        ReadingHistory::new(Arc::new(MemoryStore::new()))
    }

    fn raw_record(path: &str, last_read_at: u64, completed: &[u32]) -> Value {
        json!({
            "path": path,
            "title": "Doc",
            "lastReadAt": last_read_at,
            "readCount": 1,
            "timeSpent": 1000,
            "wordsRead": 4,
            "completedSectionIndices": completed,
        })
    }

    #[tokio::test]
    async fn test_first_read_creates_item() {
        let history = history();
        let item = history
            .add_to_reading_history("Guides/Intro.md", "Intro", &[2, 0, 2], Some(120_000), None)
            .await
            .unwrap();

        assert_eq!(item.path, "guides/intro");
        assert_eq!(item.read_count, 1);
        assert_eq!(item.time_spent, 120_000);
        assert_eq!(item.words_read, 500);
        assert_eq!(item.completed_section_indices, vec![0, 2]);
    }

    #[tokio::test]
    async fn test_repeat_reads_merge_by_union() {
        let history = history();
        history
            .add_to_reading_history("p", "T", &[1, 2], Some(1_000), Some(10))
            .await
            .unwrap();
        let item = history
            .add_to_reading_history("p", "T", &[2, 3], Some(2_000), Some(5))
            .await
            .unwrap();

        assert_eq!(item.completed_section_indices, vec![1, 2, 3]);
        assert_eq!(item.read_count, 2);
        assert_eq!(item.time_spent, 3_000);
        assert_eq!(item.words_read, 15);
        assert_eq!(history.get_reading_history(None).await.len(), 1);
    }

    #[tokio::test]
    async fn test_path_variants_share_one_record() {
        let history = history();
        history
            .add_to_reading_history("Notes.md", "Notes", &[0], None, None)
            .await;
        let item = history
            .add_to_reading_history("notes", "", &[], None, None)
            .await
            .unwrap();

        assert_eq!(item.read_count, 2);
        assert_eq!(item.title, "Notes");
        assert_eq!(item.completed_section_indices, vec![0]);
    }

    #[tokio::test]
    async fn test_mark_sections_completed() {
        let history = history();
        assert!(!history.mark_sections_completed("doc", &[1]).await);

        history.add_to_reading_history("doc", "Doc", &[0], None, None).await;
        assert!(history.mark_sections_completed("DOC.md", &[3, 1, 0]).await);

        let item = history.get_history_item("doc").await.unwrap();
        assert_eq!(item.completed_section_indices, vec![0, 1, 3]);
        assert_eq!(item.read_count, 1);
    }

    #[tokio::test]
    async fn test_clean_duplicate_history_merges_case_variants() {
        let store = Arc::new(MemoryStore::new());
        store
            .add(READING_HISTORY_STORE, raw_record("a.md", 100, &[0, 1]))
            .await
            .unwrap();
        store
            .add(READING_HISTORY_STORE, raw_record("A", 200, &[4]))
            .await
            .unwrap();
        store
            .add(READING_HISTORY_STORE, raw_record("other", 50, &[2]))
            .await
            .unwrap();
        let history = ReadingHistory::new(store.clone());

        let report = history.clean_duplicate_history().await.unwrap();
        assert_eq!(report.removed_count, 1);
        assert_eq!(report.total_count, 2);

        let merged = history.get_history_item("a").await.unwrap();
        assert_eq!(merged.completed_section_indices, vec![0, 1, 4]);
        assert_eq!(merged.last_read_at, 200);
        assert_eq!(store.get_all(READING_HISTORY_STORE).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_clean_duplicate_history_keeps_largest_counters() {
        let store = Arc::new(MemoryStore::new());
        let mut older = raw_record("guide", 10, &[]);
        older["readCount"] = json!(7);
        older["timeSpent"] = json!(90_000);
        store.add(READING_HISTORY_STORE, older).await.unwrap();
        store
            .add(READING_HISTORY_STORE, raw_record("Guide.md", 20, &[]))
            .await
            .unwrap();

        let history = ReadingHistory::new(store);
        history.clean_duplicate_history().await.unwrap();

        let item = history.get_history_item("guide").await.unwrap();
        assert_eq!(item.read_count, 7);
        assert_eq!(item.time_spent, 90_000);
        assert_eq!(item.last_read_at, 20);
    }

    #[tokio::test]
    async fn test_clean_without_duplicates_is_noop() {
        let history = history();
        history.add_to_reading_history("a", "A", &[], None, None).await;
        history.add_to_reading_history("b", "B", &[], None, None).await;

        let report = history.clean_duplicate_history().await.unwrap();
        assert_eq!(report, DedupReport { removed_count: 0, total_count: 2 });
    }

    #[tokio::test]
    async fn test_clean_normalizes_lone_legacy_path() {
        let store = Arc::new(MemoryStore::new());
        let mut legacy = raw_record("Guide.md", 10, &[0, 1]);
        legacy["readCount"] = json!(3);
        store.add(READING_HISTORY_STORE, legacy).await.unwrap();
        let history = ReadingHistory::new(store.clone());

        let report = history.clean_duplicate_history().await.unwrap();
        assert_eq!(report, DedupReport { removed_count: 0, total_count: 1 });

        let item = history.get_history_item("Guide.md").await.unwrap();
        assert_eq!(item.path, "guide");
        assert_eq!(item.read_count, 3);
        assert_eq!(item.completed_section_indices, vec![0, 1]);

        let item = history
            .add_to_reading_history("Guide.md", "Guide", &[2], None, None)
            .await
            .unwrap();
        assert_eq!(item.read_count, 4);
        assert_eq!(item.completed_section_indices, vec![0, 1, 2]);
        assert_eq!(store.get_all(READING_HISTORY_STORE).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_counters_saturate() {
        let history = history();
        history
            .add_to_reading_history("big", "Big", &[], Some(u64::MAX - 10), Some(u64::MAX - 1))
            .await
            .unwrap();
        let item = history
            .add_to_reading_history("big", "Big", &[], Some(100), Some(100))
            .await
            .unwrap();
        assert_eq!(item.time_spent, u64::MAX);
        assert_eq!(item.words_read, u64::MAX);
        assert_eq!(item.read_count, 2);

        history
            .add_to_reading_history("other", "Other", &[], Some(100), Some(100))
            .await
            .unwrap();
        let stats = history.get_reading_stats().await;
        assert_eq!(stats.total_time_spent, u64::MAX);
        assert_eq!(stats.total_words_read, u64::MAX);
    }

    #[tokio::test]
    async fn test_history_listing_and_removal() {
        let store = Arc::new(MemoryStore::new());
        store
            .add(READING_HISTORY_STORE, raw_record("old", 1, &[0]))
            .await
            .unwrap();
        store
            .add(READING_HISTORY_STORE, raw_record("new", 5, &[0, 1]))
            .await
            .unwrap();
        let history = ReadingHistory::new(store);

        let items = history.get_reading_history(None).await;
        assert_eq!(items[0].path, "new");
        assert_eq!(history.get_reading_history(Some(1)).await.len(), 1);

        let stats = history.get_reading_stats().await;
        assert_eq!(stats.documents_read, 2);
        assert_eq!(stats.sections_completed, 3);
        assert_eq!(stats.total_time_spent, 2_000);

        assert!(history.remove_from_history("old").await);
        assert!(!history.remove_from_history("old").await);
        assert!(history.clear_reading_history().await);
        assert!(history.get_reading_history(None).await.is_empty());
        assert_eq!(history.get_reading_stats().await, ReadingStats::default());
    }

    /// Delegates to a memory store but refuses `replace_all`, or everything.
    struct FaultyStore {
        inner: MemoryStore,
        fail_all: bool,
    }

    impl FaultyStore {
        fn check(&self) -> Result<(), StorageError> {
            if self.fail_all {
                Err(StorageError::Backend("unavailable".to_string()))
            } else {
                Ok(())
            }
        }
    }

    impl KeyValueStore for FaultyStore {
        async fn get_all(&self, store: &str) -> Result<Vec<StoredRecord>, StorageError> {
            self.check()?;
            self.inner.get_all(store).await
        }

        async fn get_by_index(
            &self,
            store: &str,
            index: &str,
            value: &str,
        ) -> Result<Option<StoredRecord>, StorageError> {
            self.check()?;
            self.inner.get_by_index(store, index, value).await
        }

        async fn add(&self, store: &str, value: Value) -> Result<RecordKey, StorageError> {
            self.check()?;
            self.inner.add(store, value).await
        }

        async fn update(
            &self,
            store: &str,
            key: RecordKey,
            value: Value,
        ) -> Result<(), StorageError> {
            self.check()?;
            self.inner.update(store, key, value).await
        }

        async fn delete(&self, store: &str, key: RecordKey) -> Result<(), StorageError> {
            self.check()?;
            self.inner.delete(store, key).await
        }

        async fn clear_store(&self, store: &str) -> Result<(), StorageError> {
            self.check()?;
            self.inner.clear_store(store).await
        }

        fn replace_all(
            &self,
            _store: &str,
            _values: Vec<Value>,
        ) -> impl Future<Output = Result<Vec<RecordKey>, StorageError>> + Send {
            async { Err(StorageError::Backend("swap rejected".to_string())) }
        }
    }

    #[tokio::test]
    async fn test_storage_failures_degrade_to_defaults() {
        let history = ReadingHistory::new(FaultyStore {
            inner: MemoryStore::new(),
            fail_all: true,
        });

        assert!(history
            .add_to_reading_history("p", "T", &[1], None, None)
            .await
            .is_none());
        assert!(!history.mark_sections_completed("p", &[1]).await);
        assert!(history.get_history_item("p").await.is_none());
        assert!(history.get_reading_history(None).await.is_empty());
        assert!(!history.remove_from_history("p").await);
        assert!(!history.clear_reading_history().await);
        assert_eq!(history.get_reading_stats().await, ReadingStats::default());
        assert!(history.clean_duplicate_history().await.is_err());
    }

    #[tokio::test]
    async fn test_failed_swap_keeps_original_records() {
        let inner = MemoryStore::new();
        inner
            .add(READING_HISTORY_STORE, raw_record("x.md", 1, &[0]))
            .await
            .unwrap();
        inner
            .add(READING_HISTORY_STORE, raw_record("X", 2, &[1]))
            .await
            .unwrap();
        let history = ReadingHistory::new(FaultyStore {
            inner,
            fail_all: false,
        });

        assert!(history.clean_duplicate_history().await.is_err());
        assert_eq!(history.get_reading_history(None).await.len(), 2);
    }
}
