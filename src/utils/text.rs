//! Text helpers for rendering stored documents.

/// Marker appended to every preview.
pub const ELLIPSIS: &str = "...";

/// First `max_chars` characters of `content` followed by [`ELLIPSIS`].
///
/// Counts Unicode scalar values, so a multi-byte character is never split.
pub fn preview(content: &str, max_chars: usize) -> String {
    let end = content
        .char_indices()
        .nth(max_chars)
        .map_or(content.len(), |(idx, _)| idx);
    format!("{}{}", &content[..end], ELLIPSIS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_long_text() {
        let text = "a".repeat(250);
        let p = preview(&text, 100);
        assert_eq!(p.len(), 103);
        assert!(p.ends_with("..."));
    }

    #[test]
    fn test_preview_short_text_still_marked() {
        assert_eq!(preview("hello world", 100), "hello world...");
        assert_eq!(preview("", 100), "...");
    }

    #[test]
    fn test_preview_multibyte_boundary() {
        let text = "é".repeat(120);
        let p = preview(&text, 100);
        assert_eq!(p.chars().count(), 103);
        assert!(p.starts_with(&"é".repeat(100)));
    }
}
