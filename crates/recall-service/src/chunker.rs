//! Word-window chunking.
//!
//! Splits on whitespace and emits fixed-size windows of words that overlap
//! by `overlap` words. This is not a tokenizer; word counts only approximate
//! model tokens.

use crate::error::ServiceError;

/// Split `text` into overlapping windows of at most `chunk_size` words.
///
/// Returns an empty list for text with no words. The final window may be
/// shorter than `chunk_size`.
pub fn chunk_words(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<String>, ServiceError> {
    if chunk_size == 0 {
        return Err(ServiceError::InvalidInput(
            "chunk_size must be > 0".to_string(),
        ));
    }
    if overlap >= chunk_size {
        return Err(ServiceError::InvalidInput(format!(
            "overlap ({overlap}) must be less than chunk_size ({chunk_size})"
        )));
    }

    let words: Vec<&str> = text.split_whitespace().collect();
    let step = chunk_size - overlap;
    let mut chunks = Vec::new();
    let mut start = 0;

    while start < words.len() {
        let end = (start + chunk_size).min(words.len());
        chunks.push(words[start..end].join(" "));
        if end == words.len() {
            break;
        }
        start += step;
    }

    Ok(chunks)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_overlap() {
        let text = "one two three four five six seven";
        let chunks = chunk_words(text, 3, 1).unwrap();
        assert_eq!(
            chunks,
            vec!["one two three", "three four five", "five six seven"]
        );
    }

    #[test]
    fn test_short_text_single_chunk() {
        let chunks = chunk_words("  just\n a few\twords ", 10, 2).unwrap();
        assert_eq!(chunks, vec!["just a few words"]);
    }

    #[test]
    fn test_trailing_partial_window() {
        let chunks = chunk_words("a b c d e", 2, 0).unwrap();
        assert_eq!(chunks, vec!["a b", "c d", "e"]);
    }

    #[test]
    fn test_empty_text() {
        assert!(chunk_words("   ", 5, 1).unwrap().is_empty());
    }

    #[test]
    fn test_rejects_bad_window() {
        assert!(chunk_words("a b", 0, 0).is_err());
        assert!(chunk_words("a b", 3, 3).is_err());
    }
}
