//! Document chunking
//!
//! Splits a source document into overlapping passages for indexing. The
//! index is rebuilt from the source document each run, so chunking sits on
//! the ingestion edge of the pipeline rather than behind a stored corpus.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for document chunking
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks shorter than this are dropped
    #[serde(default = "default_min_chunk_size")]
    pub min_chunk_size: usize,
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}
fn default_min_chunk_size() -> usize {
    100
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            min_chunk_size: default_min_chunk_size(),
        }
    }
}

/// A document chunk ready for embedding
#[derive(Debug, Clone)]
pub struct TextChunk {
    /// The chunk content
    pub content: String,
    /// Index of this chunk in the document
    pub index: i32,
}

/// Split a document into overlapping chunks (sliding window)
pub fn chunk_document(text: &str, config: &ChunkingConfig) -> Vec<TextChunk> {
    let mut chunks = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let total_len = chars.len();

    if total_len == 0 {
        return chunks;
    }

    let advance = if config.chunk_overlap < config.chunk_size {
        config.chunk_size - config.chunk_overlap
    } else {
        config.chunk_size / 2
    };

    let mut start = 0;
    let mut index = 0;

    while start < total_len {
        let end = (start + config.chunk_size).min(total_len);
        let window: String = chars[start..end].iter().collect();

        // Try to break at a sentence boundary, except for the final window
        let chunk_text = if end < total_len {
            trim_to_sentence_boundary(&window)
        } else {
            window
        };

        let content = chunk_text.trim();
        if content.len() >= config.min_chunk_size {
            chunks.push(TextChunk {
                content: content.to_string(),
                index,
            });
            index += 1;
        }

        start += advance.max(1);
    }

    debug!(
        input_len = text.len(),
        chunk_count = chunks.len(),
        chunk_size = config.chunk_size,
        "Document chunked"
    );

    chunks
}

/// Cut the window at its last sentence ending, when one falls in the back
/// half; otherwise keep the window as-is.
fn trim_to_sentence_boundary(window: &str) -> String {
    let sentence_endings = [". ", "! ", "? ", ".\n", "!\n", "?\n"];

    let best_break = sentence_endings
        .iter()
        .filter_map(|ending| window.rfind(ending).map(|pos| pos + ending.len()))
        .max();

    match best_break {
        Some(pos) if pos * 2 >= window.len() => window[..pos].to_string(),
        _ => window.to_string(),
    }
}
