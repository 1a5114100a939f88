//! Order-preserving dedup merge across candidate-query result lists
//!
//! Iterates the per-candidate lists in candidate order. The first sighting
//! of a passage's trimmed content claims its output position; later
//! duplicates are dropped, never repositioned. After the full pass the
//! merged list is cut to the context limit. Cost is linear in the total
//! passage count.

use super::RetrievedPassage;
use std::collections::HashSet;

/// Merges fan-out results into one deduplicated, bounded list
pub struct ResultAggregator {
    limit: usize,
}

impl ResultAggregator {
    /// Create an aggregator. `limit` is the final context bound `N` from
    /// `retrieval.final_context_limit` configuration.
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    /// Merge per-candidate passage lists, in candidate-query order.
    ///
    /// Identity is the trimmed exact content; no fuzzy matching. Passages
    /// that trim to empty are skipped so a blank passage never occupies a
    /// context slot. Fewer than `limit` unique passages returns all
    /// available, without padding.
    pub fn merge(&self, batches: Vec<Vec<RetrievedPassage>>) -> Vec<RetrievedPassage> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut merged = Vec::new();

        for batch in batches {
            for passage in batch {
                let key = passage.content.trim().to_string();
                if key.is_empty() {
                    continue;
                }
                if seen.insert(key) {
                    merged.push(passage);
                }
            }
        }

        merged.truncate(self.limit);
        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn passage(content: &str, score: f32) -> RetrievedPassage {
        RetrievedPassage {
            passage_id: Uuid::new_v4(),
            document_title: "catalog".to_string(),
            content: content.to_string(),
            chunk_index: 0,
            score,
        }
    }

    fn contents(passages: &[RetrievedPassage]) -> Vec<&str> {
        passages.iter().map(|p| p.content.as_str()).collect()
    }

    #[test]
    fn test_first_occurrence_claims_position() {
        // Lists A (earlier) and B (later) share "shared"; A's position wins.
        let a = vec![passage("alpha", 0.9), passage("shared", 0.8)];
        let b = vec![passage("shared", 0.95), passage("beta", 0.7)];

        let merged = ResultAggregator::new(10).merge(vec![a, b]);
        assert_eq!(contents(&merged), vec!["alpha", "shared", "beta"]);
        // The surviving record is the one from list A
        assert_eq!(merged[1].score, 0.8);
    }

    #[test]
    fn test_whitespace_variants_collapse() {
        let a = vec![passage("  padded content  ", 0.9)];
        let b = vec![passage("padded content", 0.8)];

        let merged = ResultAggregator::new(10).merge(vec![a, b]);
        assert_eq!(merged.len(), 1);
        // The first-seen record keeps its original, untrimmed content
        assert_eq!(merged[0].content, "  padded content  ");
    }

    #[test]
    fn test_truncates_to_limit() {
        let batch = (0..8).map(|i| passage(&format!("p{}", i), 0.5)).collect();
        let merged = ResultAggregator::new(3).merge(vec![batch]);
        assert_eq!(contents(&merged), vec!["p0", "p1", "p2"]);
    }

    #[test]
    fn test_fewer_than_limit_returns_all() {
        let batch = vec![passage("only", 0.5)];
        let merged = ResultAggregator::new(5).merge(vec![batch]);
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_idempotent_under_reapplication() {
        let aggregator = ResultAggregator::new(4);
        let input = vec![
            vec![passage("a", 0.9), passage("b", 0.8), passage("a", 0.7)],
            vec![passage("b", 0.9), passage("c", 0.6)],
        ];

        let once = aggregator.merge(input);
        let twice = aggregator.merge(vec![once.clone()]);

        assert_eq!(contents(&once), contents(&twice));
        let ids_once: Vec<_> = once.iter().map(|p| p.passage_id).collect();
        let ids_twice: Vec<_> = twice.iter().map(|p| p.passage_id).collect();
        assert_eq!(ids_once, ids_twice);
    }

    #[test]
    fn test_blank_passages_are_skipped() {
        let batch = vec![passage("   ", 0.9), passage("real", 0.8)];
        let merged = ResultAggregator::new(2).merge(vec![batch]);
        assert_eq!(contents(&merged), vec!["real"]);
    }

    #[test]
    fn test_empty_input() {
        let merged = ResultAggregator::new(3).merge(vec![]);
        assert!(merged.is_empty());
        let merged = ResultAggregator::new(3).merge(vec![vec![], vec![]]);
        assert!(merged.is_empty());
    }
}
