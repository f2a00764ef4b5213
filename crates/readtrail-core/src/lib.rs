//! readtrail Core Library
//!
//! Markdown segmentation into reading units, reading metrics, and the
//! reading history / reading list stores on top of a pluggable key/value
//! storage engine.
//!

pub mod cache;
pub mod config;
pub mod error;
pub mod history;
pub mod indexer;
pub mod metrics;
pub mod model;
pub mod reading_list;
pub mod segment;
pub mod storage;
pub mod text;
pub mod utils;
pub mod vfs;

pub use cache::SectionCache;
pub use config::ReadtrailConfig;
pub use error::{ConfigError, StorageError};
pub use history::ReadingHistory;
pub use metrics::{
    estimate_reading_progress, estimate_reading_time, estimate_words_read, ReadingEstimator,
};
pub use model::{ReadingHistoryItem, ReadingTodoItem, Section, SectionLevel};
pub use reading_list::ReadingList;
pub use segment::parse_markdown_into_sections;
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
pub use text::count_words;
pub use utils::{normalize_document_path, slugify};
