//! Chapter number parsing
//!
//! Chapter names come from the source as free text ("12", "12.5", "12,5", " 7 ").
//! Anything that does not read as a finite number is skipped by the caller.

/// Parses a chapter name into its numeric value
///
/// Surrounding whitespace is ignored and a comma is accepted as the decimal separator.
///
/// # Example
///
/// ```
/// use comic_ingest::crawler::parse_chapter_number;
///
/// assert_eq!(parse_chapter_number("12,5"), Some(12.5));
/// assert_eq!(parse_chapter_number("abc"), None);
/// ```
pub fn parse_chapter_number(name: &str) -> Option<f64> {
    let normalized = name.trim().replace(',', ".");
    if normalized.is_empty() {
        return None;
    }

    normalized.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integers_and_decimals() {
        assert_eq!(parse_chapter_number("1"), Some(1.0));
        assert_eq!(parse_chapter_number("12.5"), Some(12.5));
        assert_eq!(parse_chapter_number("0"), Some(0.0));
    }

    #[test]
    fn test_comma_decimal_separator() {
        assert_eq!(parse_chapter_number("12,5"), Some(12.5));
    }

    #[test]
    fn test_whitespace_trimmed() {
        assert_eq!(parse_chapter_number("  7 \n"), Some(7.0));
    }

    #[test]
    fn test_rejects_garbage() {
        assert_eq!(parse_chapter_number("abc"), None);
        assert_eq!(parse_chapter_number(""), None);
        assert_eq!(parse_chapter_number("   "), None);
        assert_eq!(parse_chapter_number("12-13"), None);
        assert_eq!(parse_chapter_number("1,2,3"), None);
    }

    #[test]
    fn test_rejects_non_finite() {
        assert_eq!(parse_chapter_number("inf"), None);
        assert_eq!(parse_chapter_number("NaN"), None);
        assert_eq!(parse_chapter_number("1e999"), None);
    }
}
