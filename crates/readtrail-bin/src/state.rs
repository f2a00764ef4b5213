use std::sync::Arc;

use readtrail_core::StorageError;
use readtrail_core::vfs::{FileSystem, PhysicalFileSystem};
use readtrail_core::{JsonFileStore, ReadingHistory, ReadingList, ReadtrailConfig};

/// Stores shared by every command
/// History and reading list live in the same store file
pub struct AppState {
    pub config: ReadtrailConfig,
    pub fs: Arc<dyn FileSystem>,
    pub history: ReadingHistory<Arc<JsonFileStore>>,
    pub list: ReadingList<Arc<JsonFileStore>>,
}

impl AppState {
    pub fn open(config: ReadtrailConfig) -> Result<Self, StorageError> {
        Self::open_with(config, Arc::new(PhysicalFileSystem))
    }

    pub fn open_with(
        config: ReadtrailConfig,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self, StorageError> {
        let store = Arc::new(JsonFileStore::open(config.storage.path.clone(), fs.clone())?);
        Ok(Self {
            history: ReadingHistory::with_estimator(store.clone(), config.estimator()),
            list: ReadingList::new(store),
            fs,
            config,
        })
    }
}
