//! Markdown-aware word counting.

use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```.*?```").unwrap());
static INLINE_CODE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`[^`\n]*`").unwrap());
static HEADING_MARKER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]{0,3}#{1,6}[ \t]+").unwrap());
static IMAGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"!\[[^\]]*\]\([^)]*\)").unwrap());
static LINK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([^\]]*)\]\([^)]*\)").unwrap());
static BOLD_STAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*([^*]+)\*\*").unwrap());
static BOLD_UNDERSCORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"__([^_]+)__").unwrap());
static ITALIC_STAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*([^*\n]+)\*").unwrap());
static ITALIC_UNDERSCORE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"_([^_\n]+)_").unwrap());
static HTML_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<[^>]+>").unwrap());

/// Remove Markdown syntax, keeping the readable text.
///
/// Images go before links so that `![alt](src)` disappears entirely
/// instead of leaving `!alt` behind.
pub fn strip_markdown(text: &str) -> String {
    let text = FENCED_CODE_RE.replace_all(text, " ");
    let text = INLINE_CODE_RE.replace_all(&text, " ");
    let text = HEADING_MARKER_RE.replace_all(&text, "");
    let text = IMAGE_RE.replace_all(&text, " ");
    let text = LINK_RE.replace_all(&text, "${1}");
    let text = BOLD_STAR_RE.replace_all(&text, "${1}");
    let text = BOLD_UNDERSCORE_RE.replace_all(&text, "${1}");
    let text = ITALIC_STAR_RE.replace_all(&text, "${1}");
    let text = ITALIC_UNDERSCORE_RE.replace_all(&text, "${1}");
    let text = HTML_TAG_RE.replace_all(&text, " ");
    text.into_owned()
}

/// Count the words of a Markdown text after stripping its syntax.
///
/// `None` counts as zero words.
///
/// ```
/// use readtrail_core::count_words;
///
/// assert_eq!(count_words("Read the [guide](https://example.com) **now**"), 4);
/// assert_eq!(count_words(""), 0);
/// assert_eq!(count_words(None), 0);
/// ```
pub fn count_words<'a>(text: impl Into<Option<&'a str>>) -> usize {
    match text.into() {
        Some(text) if !text.trim().is_empty() => strip_markdown(text).split_whitespace().count(),
        _ => 0,
    }
}
