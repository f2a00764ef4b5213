use std::path::Path;

use readtrail_core::cache::SectionCache;
use readtrail_core::indexer::ContentIndexer;
use readtrail_core::segment::{document_title, parse_markdown_into_sections, split_frontmatter};
use serde_json::json;

use super::HandlerResult;
use crate::state::AppState;

/// Parsed sections are reused across `index` runs from this file in the
/// output directory
pub const SECTION_CACHE_FILE: &str = ".sections-cache.bin";

/// Handle `readtrail sections <file>`
pub fn handle_sections(state: &AppState, file: &Path, with_content: bool) -> HandlerResult {
    let content = state.fs.read_to_string(file)?;
    let (frontmatter, body) = split_frontmatter(&content);
    let sections = parse_markdown_into_sections(body);

    let fallback = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let title = document_title(frontmatter.as_ref(), &sections, &fallback);
    let total_word_count: usize = sections.iter().map(|s| s.word_count).sum();

    let sections = if with_content {
        serde_json::to_value(&sections)?
    } else {
        serde_json::to_value(sections.iter().map(|s| s.summary()).collect::<Vec<_>>())?
    };

    Ok(json!({
        "title": title,
        "totalWordCount": total_word_count,
        "estimatedReadingTime": state.config.estimator().reading_time_ms(total_word_count),
        "sections": sections,
    }))
}

/// Handle `readtrail index <root> --out <dir>`
pub fn handle_index(state: &AppState, root: &Path, out_dir: &Path) -> HandlerResult {
    let cache_path = out_dir.join(SECTION_CACHE_FILE);
    let mut cache = if state.fs.exists(&cache_path) {
        SectionCache::load(&cache_path, state.fs.as_ref()).unwrap_or_else(|err| {
            log::warn!("discarding section cache {cache_path:?}: {err}");
            SectionCache::new()
        })
    } else {
        SectionCache::new()
    };

    let indexer = ContentIndexer::new(
        state.fs.as_ref(),
        &state.config.indexer,
        state.config.estimator(),
    );
    let artifacts = indexer.build(root, &mut cache);
    let written = artifacts.write(out_dir, state.fs.as_ref())?;

    if let Err(err) = cache.save(&cache_path, state.fs.as_ref()) {
        log::warn!("failed to save section cache {cache_path:?}: {err}");
    }
    let cache_stats = cache.stats();
    log::debug!(
        "section cache: {} hits, {} misses",
        cache_stats.hits,
        cache_stats.misses
    );

    Ok(json!({
        "stats": artifacts.stats,
        "written": written,
    }))
}
