//! Canonical slug generation
//!
//! Catalog natural keys for comics and categories are derived from display names, never
//! taken from the source, so the same title always maps to the same row no matter which
//! listing it was discovered from.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Derives a URL-safe slug from a display name
///
/// The name is lowercased, `đ` is folded to `d`, diacritics are stripped by decomposing to
/// NFD and dropping combining marks, every run of characters outside `[a-z0-9]` becomes a
/// single hyphen, and leading/trailing hyphens are trimmed. Returns an empty string when
/// nothing alphanumeric survives.
///
/// # Example
///
/// ```
/// use comic_ingest::slugify;
///
/// assert_eq!(slugify("Đảo Hải Tặc"), "dao-hai-tac");
/// ```
pub fn slugify(input: &str) -> String {
    let lowered = input.to_lowercase().replace('đ', "d");

    let mut slug = String::with_capacity(lowered.len());
    let mut pending_hyphen = false;

    for c in lowered.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            pending_hyphen = true;
        }
    }

    slug
}
