//! Build-time content indexing.
//!
//! Walks a content root and produces the three artifacts consumed at read
//! time: per-document section metadata, the category/file content index and
//! the category-only directory structure.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cache::SectionCache;
use crate::config::IndexerConfig;
use crate::metrics::ReadingEstimator;
use crate::model::SectionSummary;
use crate::segment::{document_title, split_frontmatter};
use crate::vfs::FileSystem;

pub const SECTION_METADATA_FILE: &str = "section-metadata.json";
pub const CONTENT_INDEX_FILE: &str = "content-index.json";
pub const DIRECTORY_STRUCTURE_FILE: &str = "directory-structure.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    pub path: String,
    pub sections: Vec<SectionSummary>,
    pub total_word_count: usize,
    /// Milliseconds
    pub estimated_reading_time: u64,
    pub title: String,
    pub frontmatter: Option<serde_json::Value>,
}

/// Document path → metadata, ordered by path.
pub type SectionMetadata = BTreeMap<String, DocumentMetadata>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Directory path relative to the content root
    pub id: String,
    pub name: String,
    pub categories: Vec<Category>,
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentIndex {
    pub categories: Vec<Category>,
    /// Documents directly under the content root
    pub files: Vec<FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryNode {
    pub id: String,
    pub name: String,
    pub categories: Vec<DirectoryNode>,
}

impl From<&Category> for DirectoryNode {
    fn from(category: &Category) -> Self {
        Self {
            id: category.id.clone(),
            name: category.name.clone(),
            categories: category.categories.iter().map(DirectoryNode::from).collect(),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexingStats {
    pub total_files: usize,
    pub documents: usize,
    pub sections: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ContentArtifacts {
    pub metadata: SectionMetadata,
    pub index: ContentIndex,
    pub stats: IndexingStats,
}

impl ContentArtifacts {
    pub fn directory_structure(&self) -> Vec<DirectoryNode> {
        self.index.categories.iter().map(DirectoryNode::from).collect()
    }

    /// Write the three artifacts into `out_dir`, returning the written paths.
    pub fn write(
        &self,
        out_dir: &Path,
        fs: &dyn FileSystem,
    ) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
        let outputs = [
            (SECTION_METADATA_FILE, serde_json::to_vec_pretty(&self.metadata)?),
            (CONTENT_INDEX_FILE, serde_json::to_vec_pretty(&self.index)?),
            (
                DIRECTORY_STRUCTURE_FILE,
                serde_json::to_vec_pretty(&self.directory_structure())?,
            ),
        ];

        let mut written = Vec::with_capacity(outputs.len());
        for (name, buffer) in outputs {
            let path = out_dir.join(name);
            fs.write_all(&path, &buffer)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Indexer bridging I/O (FileSystem) and the segmentation engine.
pub struct ContentIndexer<'a> {
    fs: &'a dyn FileSystem,
    config: &'a IndexerConfig,
    estimator: ReadingEstimator,
}

impl<'a> ContentIndexer<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        config: &'a IndexerConfig,
        estimator: ReadingEstimator,
    ) -> Self {
        Self {
            fs,
            config,
            estimator,
        }
    }

    /// Index every document under `root`, reusing sections from `cache`
    /// for unchanged content.
    pub fn build(&self, root: &Path, cache: &mut SectionCache) -> ContentArtifacts {
        let mut files = Vec::new();
        for ext in &self.config.extensions {
            files.extend(self.fs.list_files(root, ext, &self.config.ignore_dirs));
        }
        files.sort();

        let mut artifacts = ContentArtifacts::default();
        artifacts.stats.total_files = files.len();

        for path in &files {
            let Some(relative) = relative_path(root, path) else {
                artifacts.stats.skipped += 1;
                continue;
            };
            let content = match self.fs.read_to_string(path) {
                Ok(content) => content,
                Err(err) => {
                    log::warn!("skipping {path:?}: {err}");
                    artifacts.stats.skipped += 1;
                    continue;
                }
            };

            let document = self.index_document(&relative, &content, cache);
            artifacts.stats.documents += 1;
            artifacts.stats.sections += document.sections.len();
            insert_file(&mut artifacts.index, &relative);
            artifacts.metadata.insert(relative, document);
        }

        log::info!(
            "indexed {} documents ({} sections, {} skipped)",
            artifacts.stats.documents,
            artifacts.stats.sections,
            artifacts.stats.skipped
        );
        artifacts
    }

    /// Metadata of a single document whose path relative to the root is
    /// `relative`.
    pub fn index_document(
        &self,
        relative: &str,
        content: &str,
        cache: &mut SectionCache,
    ) -> DocumentMetadata {
        let (frontmatter, body) = split_frontmatter(content);
        let sections = cache.get_or_parse(relative, body);
        let total_word_count = sections.iter().map(|s| s.word_count).sum();
        let title = document_title(frontmatter.as_ref(), sections, &file_stem(relative));

        DocumentMetadata {
            path: relative.to_string(),
            sections: sections.iter().map(|s| s.summary()).collect(),
            total_word_count,
            estimated_reading_time: self.estimator.reading_time_ms(total_word_count),
            title,
            frontmatter,
        }
    }
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

fn file_stem(relative: &str) -> String {
    let name = relative.rsplit('/').next().unwrap_or(relative);
    match name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => name.to_string(),
    }
}

fn insert_file(index: &mut ContentIndex, relative: &str) {
    let entry = FileEntry {
        path: relative.to_string(),
    };
    let mut dirs: Vec<&str> = relative.split('/').collect();
    dirs.pop();

    if dirs.is_empty() {
        index.files.push(entry);
    } else {
        insert_into(&mut index.categories, &dirs, "", entry);
    }
}

fn insert_into(categories: &mut Vec<Category>, dirs: &[&str], parent: &str, entry: FileEntry) {
    let Some((dir, rest)) = dirs.split_first() else {
        return;
    };
    let id = if parent.is_empty() {
        dir.to_string()
    } else {
        format!("{parent}/{dir}")
    };

    let position = match categories.iter().position(|c| c.id == id) {
        Some(position) => position,
        None => {
            categories.push(Category {
                id: id.clone(),
                name: dir.to_string(),
                categories: Vec::new(),
                files: Vec::new(),
            });
            categories.len() - 1
        }
    };

    let category = &mut categories[position];
    if rest.is_empty() {
        category.files.push(entry);
    } else {
        insert_into(&mut category.categories, rest, &id, entry);
    }
}
