//! Text processing utilities.

use sha2::{Digest, Sha256};

/// SHA-256 of `content` as lowercase hex.
pub fn calculate_checksum(content: &str) -> String {
    let hash = Sha256::digest(content.as_bytes());
    hex::encode(hash)
}

/// Replace every whitespace run with a single space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// First `max_chars` characters of `text`, with an ellipsis when cut.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calculate_checksum() {
        let checksum = calculate_checksum("hello world");
        assert_eq!(checksum.len(), 64);
        assert_eq!(
            checksum,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_ne!(checksum, calculate_checksum("hello world!"));
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\n\n b\t\tc  "), "a b c");
        assert_eq!(collapse_whitespace(" \n\t "), "");
        assert_eq!(collapse_whitespace("single"), "single");
    }

    #[test]
    fn test_preview() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("exactly", 7), "exactly");
        assert_eq!(preview("truncate me", 8), "truncate...");
        assert_eq!(preview("éèêë", 2), "éè...");
    }
}
