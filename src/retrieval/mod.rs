//! Candidate-query retrieval
//!
//! The fan-out unit of the pipeline: one candidate query in, up to `k`
//! scored passages out, plus the order-preserving dedup merge across all
//! candidates.

mod candidate;
mod merge;

pub use candidate::CandidateRetriever;
pub use merge::ResultAggregator;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Passage retrieved from the similarity index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievedPassage {
    /// Passage ID
    pub passage_id: Uuid,

    /// Title of the source document
    pub document_title: String,

    /// Passage content
    pub content: String,

    /// Position of the passage within its document
    pub chunk_index: i32,

    /// Similarity score as reported by the index
    pub score: f32,
}
