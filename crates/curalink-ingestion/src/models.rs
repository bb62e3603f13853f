//! Normalization helpers shared by the source adapters.
//!
//! The canonical record shapes live in `curalink_db::schema`; this module
//! carries the placeholders and the text cap that every adapter applies so a
//! required field is never left empty and long free text never reaches the
//! store unbounded.

pub use curalink_db::schema::{PublicationRecord, PublicationSource, TrialRecord};

/// Upper bound on abstract/description text, in characters.
pub const MAX_TEXT_LEN: usize = 5000;
/// Appended when text is cut at `MAX_TEXT_LEN`.
pub const TRUNCATION_MARKER: &str = "...";

pub const NO_TITLE: &str = "No title";
pub const NO_ABSTRACT: &str = "No abstract available";
pub const NO_DESCRIPTION: &str = "No description available";
pub const UNKNOWN: &str = "Unknown";

/// Cap free text at `MAX_TEXT_LEN` characters plus the marker. Text
/// strictly under the cap passes through unchanged; text at or over the
/// cap is cut to the first `MAX_TEXT_LEN` characters and marked. Counts
/// characters, not bytes, so multi-byte text is never split mid-character.
pub fn truncate_text(text: &str) -> String {
    // nth is zero-based: Some here means the text has >= MAX_TEXT_LEN chars.
    if text.char_indices().nth(MAX_TEXT_LEN - 1).is_none() {
        return text.to_string();
    }
    let byte_end = text
        .char_indices()
        .nth(MAX_TEXT_LEN)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let mut out = String::with_capacity(byte_end + TRUNCATION_MARKER.len());
    out.push_str(&text[..byte_end]);
    out.push_str(TRUNCATION_MARKER);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(truncate_text("short abstract"), "short abstract");
    }

    #[test]
    fn test_text_just_under_cap_unchanged() {
        let text = "a".repeat(MAX_TEXT_LEN - 1);
        assert_eq!(truncate_text(&text), text);
    }

    #[test]
    fn test_text_at_exactly_cap_gets_marker() {
        let text = "a".repeat(MAX_TEXT_LEN);
        let truncated = truncate_text(&text);
        assert_eq!(truncated.chars().count(), MAX_TEXT_LEN + TRUNCATION_MARKER.len());
        assert!(truncated.ends_with(TRUNCATION_MARKER));
        assert!(truncated.starts_with(&text));
    }

    #[test]
    fn test_text_over_cap_is_cut_with_marker() {
        let text = "a".repeat(MAX_TEXT_LEN + 200);
        let truncated = truncate_text(&text);
        assert_eq!(truncated.chars().count(), MAX_TEXT_LEN + TRUNCATION_MARKER.len());
        assert!(truncated.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_multibyte_text_not_split() {
        let text = "é".repeat(MAX_TEXT_LEN + 1);
        let truncated = truncate_text(&text);
        assert_eq!(truncated.chars().count(), MAX_TEXT_LEN + TRUNCATION_MARKER.len());
    }
}
