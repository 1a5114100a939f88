//! Context block assembly
//!
//! Normalizes deduplicated passages into a single prompt-ready block. An
//! empty block is a valid, expected state for the orchestrator, not an
//! error.

use crate::retrieval::RetrievedPassage;

/// Normalize and concatenate passages into one context block.
///
/// Each run of line-break characters inside a passage collapses to a single
/// space; interior spacing is otherwise left alone and the passage is
/// end-trimmed. Normalized passages are joined with a blank-line separator.
/// An empty input yields the empty string.
pub fn format_context(passages: &[RetrievedPassage]) -> String {
    passages
        .iter()
        .map(|p| normalize_passage(&p.content))
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn normalize_passage(content: &str) -> String {
    content
        .split(['\r', '\n'])
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn passage(content: &str) -> RetrievedPassage {
        RetrievedPassage {
            passage_id: Uuid::new_v4(),
            document_title: "catalog".to_string(),
            content: content.to_string(),
            chunk_index: 0,
            score: 0.5,
        }
    }

    #[test]
    fn test_empty_input_yields_empty_string() {
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn test_line_breaks_become_single_spaces() {
        let out = format_context(&[passage("line one\nline two\r\nline three")]);
        assert_eq!(out, "line one line two line three");
    }

    #[test]
    fn test_blank_line_separator_between_passages() {
        let out = format_context(&[passage("first passage"), passage("second passage")]);
        assert_eq!(out, "first passage\n\nsecond passage");
    }

    #[test]
    fn test_passages_are_end_trimmed() {
        let out = format_context(&[passage("  padded  ")]);
        assert_eq!(out, "padded");
    }

    #[test]
    fn test_blank_passage_contributes_nothing() {
        let out = format_context(&[passage("\n\n"), passage("real content")]);
        assert_eq!(out, "real content");
    }
}
