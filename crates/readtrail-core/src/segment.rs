//! Line-oriented segmentation of Markdown into heading-bounded sections.
//!
//! Only level-1 and level-2 ATX headings open a new section. Deeper headings
//! stay inside their parent section, and nothing inside a fenced code block
//! is ever treated as a heading.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Section, SectionLevel};
use crate::text::count_words;
use crate::utils::slugify;

static H1_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#\s+(.+)$").unwrap());
static H2_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^##\s+(.+)$").unwrap());

const FENCE: &str = "```";
pub const INTRODUCTION_ID: &str = "introduction";
const INTRODUCTION_TITLE: &str = "Introduction";

struct SectionDraft {
    title: String,
    level: SectionLevel,
    content: String,
}

enum Mode {
    Intro,
    InSection(SectionDraft),
}

/// Segmentation state carried across lines.
///
/// Feed lines with [`Segmenter::step`] and close with [`Segmenter::finish`]:
///
/// ```
/// use readtrail_core::segment::Segmenter;
///
/// let sections = "# A\nbody\n"
///     .lines()
///     .fold(Segmenter::new(), Segmenter::step)
///     .finish();
/// assert_eq!(sections[0].content, "# A\nbody\n");
/// ```
pub struct Segmenter {
    mode: Mode,
    intro: String,
    in_code_block: bool,
    done: Vec<SectionDraft>,
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Segmenter {
    pub fn new() -> Self {
        Self {
            mode: Mode::Intro,
            intro: String::new(),
            in_code_block: false,
            done: Vec::new(),
        }
    }

    pub fn in_code_block(&self) -> bool {
        self.in_code_block
    }

    /// Number of sections closed so far, not counting the open one.
    pub fn closed_sections(&self) -> usize {
        self.done.len()
    }

    pub fn step(mut self, line: &str) -> Self {
        let line = line.trim_end();

        if line.trim_start().starts_with(FENCE) {
            self.in_code_block = !self.in_code_block;
            self.append(line);
            return self;
        }

        if self.in_code_block {
            self.append(line);
            return self;
        }

        match heading(line) {
            Some((level, title)) => self.open(level, title),
            None => self.append(line),
        }
        self
    }

    pub fn finish(mut self) -> Vec<Section> {
        self.flush();
        assign_sections(self.done)
    }

    fn append(&mut self, line: &str) {
        let buffer = match &mut self.mode {
            Mode::InSection(draft) => &mut draft.content,
            Mode::Intro => &mut self.intro,
        };
        buffer.push_str(line);
        buffer.push('\n');
    }

    fn open(&mut self, level: SectionLevel, title: &str) {
        self.flush();
        let mut content = "#".repeat(level.depth());
        content.push(' ');
        content.push_str(title);
        content.push('\n');
        self.mode = Mode::InSection(SectionDraft {
            title: title.to_string(),
            level,
            content,
        });
    }

    fn flush(&mut self) {
        match std::mem::replace(&mut self.mode, Mode::Intro) {
            Mode::InSection(draft) => self.done.push(draft),
            Mode::Intro => {
                let intro = std::mem::take(&mut self.intro);
                if !intro.trim().is_empty() {
                    self.done.push(SectionDraft {
                        title: INTRODUCTION_TITLE.to_string(),
                        level: SectionLevel::Introduction,
                        content: intro,
                    });
                }
            }
        }
    }
}

fn heading(line: &str) -> Option<(SectionLevel, &str)> {
    if let Some(caps) = H1_RE.captures(line) {
        return caps.get(1).map(|m| (SectionLevel::Top, m.as_str()));
    }
    H2_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| (SectionLevel::Sub, m.as_str()))
}

/// Attach ids and word counts.
///
/// Colliding slugs get `-1`, `-2`, ... appended in document order; a heading
/// with an empty slug is named after its 1-based position.
fn assign_sections(drafts: Vec<SectionDraft>) -> Vec<Section> {
    let mut used: HashSet<String> = HashSet::new();

    drafts
        .into_iter()
        .enumerate()
        .map(|(index, draft)| {
            let base = match draft.level {
                SectionLevel::Introduction => INTRODUCTION_ID.to_string(),
                _ => {
                    let slug = slugify(&draft.title);
                    if slug.is_empty() {
                        format!("section-{}", index + 1)
                    } else {
                        slug
                    }
                }
            };

            let mut id = base.clone();
            let mut suffix = 0;
            while used.contains(&id) {
                suffix += 1;
                id = format!("{base}-{suffix}");
            }
            used.insert(id.clone());

            Section {
                id,
                word_count: count_words(draft.content.as_str()),
                title: draft.title,
                level: draft.level,
                content: draft.content,
            }
        })
        .collect()
}

/// Split a Markdown document into ordered sections.
///
/// Never fails: an empty document yields no sections, a document without
/// headings yields a single `introduction` section.
pub fn parse_markdown_into_sections(markdown: &str) -> Vec<Section> {
    let sections = markdown
        .lines()
        .fold(Segmenter::new(), Segmenter::step)
        .finish();
    log::debug!("segmented document into {} sections", sections.len());
    sections
}

/// Separate a leading YAML frontmatter block from the document body.
///
/// The block must start on the very first line with `---` and end with a
/// `---` or `...` line. Invalid YAML leaves the text untouched.
pub fn split_frontmatter(text: &str) -> (Option<serde_json::Value>, &str) {
    let mut lines = text.split_inclusive('\n');
    let Some(first) = lines.next() else {
        return (None, text);
    };
    if first.trim_end() != "---" {
        return (None, text);
    }

    let mut offset = first.len();
    for line in lines {
        let end = offset + line.len();
        let trimmed = line.trim_end();
        if trimmed == "---" || trimmed == "..." {
            let yaml = &text[first.len()..offset];
            let body = &text[end..];
            return match serde_yaml::from_str::<serde_json::Value>(yaml) {
                Ok(serde_json::Value::Null) => (None, body),
                Ok(value) => (Some(value), body),
                Err(err) => {
                    log::warn!("ignoring invalid frontmatter: {err}");
                    (None, text)
                }
            };
        }
        offset = end;
    }

    (None, text)
}

/// Pick a display title: frontmatter `title`, then the first level-1
/// heading, then `fallback`.
pub fn document_title(
    frontmatter: Option<&serde_json::Value>,
    sections: &[Section],
    fallback: &str,
) -> String {
    if let Some(title) = frontmatter
        .and_then(|fm| fm.get("title"))
        .and_then(|v| v.as_str())
    {
        return title.to_string();
    }

    sections
        .iter()
        .find(|s| s.level == SectionLevel::Top)
        .map(|s| s.title.clone())
        .unwrap_or_else(|| fallback.to_string())
}

/// Word-weighted completion of a document, `0..=100`.
///
/// Falls back to the fraction of completed sections when the document has no
/// countable words. Out-of-range indices are ignored.
pub fn section_progress(sections: &[Section], completed: &[u32]) -> u8 {
    if sections.is_empty() {
        return 0;
    }

    let done: HashSet<usize> = completed
        .iter()
        .map(|&i| i as usize)
        .filter(|&i| i < sections.len())
        .collect();

    let total_words: usize = sections.iter().map(|s| s.word_count).sum();
    let ratio = if total_words == 0 {
        done.len() as f64 / sections.len() as f64
    } else {
        let read: usize = done.iter().map(|&i| sections[i].word_count).sum();
        read as f64 / total_words as f64
    };

    (ratio * 100.0).round().min(100.0) as u8
}
