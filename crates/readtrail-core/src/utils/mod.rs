pub mod id;
pub mod time;

/// Normalize a document path into the identity used by the reading stores.
///
/// Converts a path to a normalized key by:
/// - Converting backslashes to forward slashes (Windows compatibility)
/// - Lower-casing
/// - Removing one trailing `.md` extension
///
/// # Examples
///
/// ```
/// use readtrail_core::normalize_document_path;
///
/// assert_eq!(normalize_document_path("Guides/Intro.md"), "guides/intro");
/// assert_eq!(normalize_document_path("A"), "a");
/// assert_eq!(normalize_document_path("guides\\setup.MD"), "guides/setup");
/// ```
pub fn normalize_document_path(path: &str) -> String {
    let lowered = path.trim().replace('\\', "/").to_lowercase();
    match lowered.strip_suffix(".md") {
        Some(stem) => stem.to_string(),
        None => lowered,
    }
}

/// Slugify a heading text into a URL-safe anchor ID.
///
/// Rules:
/// - Convert to lowercase
/// - Keep letters and digits (including Unicode), underscores and hyphens
/// - Drop every other character (punctuation, emoji)
/// - Runs of whitespace and hyphens become a single hyphen
/// - Trim leading/trailing hyphens
///
/// Slugs are not unique within a document; the segmenter resolves collisions.
///
/// # Examples
///
/// ```
/// use readtrail_core::slugify;
///
/// assert_eq!(slugify("My Cool Header"), "my-cool-header");
/// assert_eq!(slugify("Hello (World)!"), "hello-world");
/// assert_eq!(slugify("A  -  B"), "a-b");
/// assert_eq!(slugify("-Hello-"), "hello");
/// assert_eq!(slugify("!!!"), "");
/// ```
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.to_lowercase().chars() {
        if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        } else if c.is_alphanumeric() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        }
    }

    slug
}
