use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::model::Section;
use crate::segment::parse_markdown_into_sections;

/// SHA-256 hex digest of a document's content.
pub fn compute_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}

#[derive(Serialize, Deserialize, Debug, Clone)]
struct CachedSections {
    digest: String,
    sections: Vec<Section>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
}

/// Parsed sections per document, keyed by the caller's document key.
///
/// An entry is reused while the content digest matches and replaced by a
/// fresh parse as soon as it does not.
#[derive(Serialize, Deserialize, Debug)]
pub struct SectionCache {
    version: u32,
    entries: HashMap<String, CachedSections>,
    #[serde(skip)]
    stats: CacheStats,
}

impl Default for SectionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SectionCache {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            entries: HashMap::new(),
            stats: CacheStats::default(),
        }
    }

    pub fn get_or_parse(&mut self, key: &str, markdown: &str) -> &[Section] {
        let digest = compute_digest(markdown);
        let fresh = self
            .entries
            .get(key)
            .is_some_and(|cached| cached.digest == digest);

        if fresh {
            self.stats.hits += 1;
            log::debug!("section cache hit for {key:?}");
        } else {
            self.stats.misses += 1;
            log::debug!("section cache miss for {key:?}");
            self.entries.insert(
                key.to_string(),
                CachedSections {
                    digest,
                    sections: parse_markdown_into_sections(markdown),
                },
            );
        }

        self.entries
            .get(key)
            .map(|cached| cached.sections.as_slice())
            .unwrap_or_default()
    }

    pub fn invalidate(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn load(
        path: &Path,
        fs: &dyn crate::vfs::FileSystem,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let buffer = fs.read_all(path)?;
        let cache: SectionCache = bincode::deserialize(&buffer)?;

        if cache.version != Self::CURRENT_VERSION {
            return Err("Incompatible cache version".into());
        }

        Ok(cache)
    }

    pub fn save(
        &self,
        path: &Path,
        fs: &dyn crate::vfs::FileSystem,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let buffer = bincode::serialize(self)?;
        fs.write_all(path, &buffer)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::PhysicalFileSystem;
    use tempfile::TempDir;

    #[test]
    fn test_digest() {
        assert_eq!(compute_digest("Content A"), compute_digest("Content A"));
        assert_ne!(compute_digest("Content A"), compute_digest("Content B"));
        assert_eq!(compute_digest("Content A").len(), 64);
    }

    #[test]
    fn test_reparses_only_on_change() {
        let mut cache = SectionCache::new();

        assert_eq!(cache.get_or_parse("doc", "# A\ntext\n").len(), 1);
        assert_eq!(cache.get_or_parse("doc", "# A\ntext\n").len(), 1);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });

        let sections = cache.get_or_parse("doc", "# A\n# B\n");
        assert_eq!(sections.len(), 2);
        assert_eq!(cache.stats().misses, 2);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_invalidate_forces_reparse() {
        let mut cache = SectionCache::new();
        cache.get_or_parse("doc", "text");
        assert!(cache.invalidate("doc"));
        assert!(!cache.invalidate("doc"));
        cache.get_or_parse("doc", "text");
        assert_eq!(cache.stats().misses, 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sections.bin");
        let fs = PhysicalFileSystem;

        let mut cache = SectionCache::new();
        cache.get_or_parse("doc", "# Title\nsome words\n");
        cache.save(&path, &fs).expect("Failed to save cache");

        let mut loaded = SectionCache::load(&path, &fs).expect("Failed to load cache");
        assert_eq!(loaded.len(), 1);
        let sections = loaded.get_or_parse("doc", "# Title\nsome words\n");
        assert_eq!(sections[0].id, "title");
        assert_eq!(loaded.stats().hits, 1);
    }
}
