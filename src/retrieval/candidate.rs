//! Single-candidate retrieval against the similarity index

use super::RetrievedPassage;
use crate::embeddings::Embedder;
use crate::errors::{AppError, Result};
use crate::index::SimilarityIndex;
use std::sync::Arc;
use tracing::debug;

/// Retrieves top-`k` passages for one candidate query
pub struct CandidateRetriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn SimilarityIndex>,
    passages_per_query: usize,
}

impl CandidateRetriever {
    /// Create a new retriever. `passages_per_query` is the fan-out width `k`
    /// from `retrieval.passages_per_query` configuration.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn SimilarityIndex>,
        passages_per_query: usize,
    ) -> Self {
        Self {
            embedder,
            index,
            passages_per_query,
        }
    }

    /// Embed the candidate query and run the index lookup.
    ///
    /// Embedding failures keep their service classification; index failures
    /// surface as retrieval errors. An empty match is a valid empty list.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<RetrievedPassage>> {
        let embedding = self.embedder.embed(query).await?;

        let passages = self
            .index
            .query(&embedding, self.passages_per_query)
            .await
            .map_err(|e| match e {
                AppError::Retrieval { .. } => e,
                other => AppError::Retrieval {
                    message: other.to_string(),
                },
            })?;

        debug!(query = %query, hits = passages.len(), "Candidate retrieval complete");

        Ok(passages)
    }
}
