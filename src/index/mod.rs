//! Similarity index seam
//!
//! The nearest-neighbor store is an external collaborator; this module
//! defines its read-path contract and ships an in-memory cosine index that
//! is rebuilt from the source document on each run. No index state is
//! persisted anywhere.

use crate::chunker::{chunk_document, ChunkingConfig};
use crate::embeddings::Embedder;
use crate::errors::Result;
use crate::retrieval::RetrievedPassage;
use async_trait::async_trait;
use tracing::debug;
use uuid::Uuid;

/// Read path of a vector index
#[async_trait]
pub trait SimilarityIndex: Send + Sync {
    /// Top-`k` passages by descending similarity. An empty corpus match is a
    /// valid empty list, not an error.
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievedPassage>>;
}

/// One indexed passage with its embedding
struct IndexEntry {
    passage_id: Uuid,
    document_title: String,
    content: String,
    chunk_index: i32,
    embedding: Vec<f32>,
}

/// In-memory cosine-similarity index
#[derive(Default)]
pub struct InMemoryIndex {
    entries: Vec<IndexEntry>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one embedded passage
    pub fn insert(
        &mut self,
        document_title: &str,
        chunk_index: i32,
        content: &str,
        embedding: Vec<f32>,
    ) {
        self.entries.push(IndexEntry {
            passage_id: Uuid::new_v4(),
            document_title: document_title.to_string(),
            content: content.to_string(),
            chunk_index,
            embedding,
        });
    }

    /// Chunk, embed, and index a source document. `chunking.chunk_size` and
    /// `chunking.chunk_overlap` configuration shape the passages.
    pub async fn build(
        document_title: &str,
        text: &str,
        config: &ChunkingConfig,
        embedder: &dyn Embedder,
    ) -> Result<Self> {
        let chunks = chunk_document(text, config);
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;

        let mut index = Self::new();
        for (chunk, embedding) in chunks.into_iter().zip(embeddings) {
            index.insert(document_title, chunk.index, &chunk.content, embedding);
        }

        debug!(
            document = document_title,
            passages = index.len(),
            "Index built"
        );

        Ok(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Cosine similarity between two vectors; 0.0 for mismatched or zero-norm
/// inputs
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[async_trait]
impl SimilarityIndex for InMemoryIndex {
    async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievedPassage>> {
        if k == 0 {
            return Ok(vec![]);
        }

        let mut scored: Vec<RetrievedPassage> = self
            .entries
            .iter()
            .map(|entry| RetrievedPassage {
                passage_id: entry.passage_id,
                document_title: entry.document_title.clone(),
                content: entry.content.clone(),
                chunk_index: entry.chunk_index,
                score: cosine_similarity(embedding, &entry.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);

        Ok(scored)
    }
}
