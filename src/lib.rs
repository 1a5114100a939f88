//! AnswerForge
//!
//! Grounded question answering over a fixed document corpus. One question is
//! expanded into semantically diverse candidate queries, each candidate fans
//! out to similarity search, results are merged with an order-preserving
//! dedup and bounded to a context limit, and a single grounded generation
//! call produces either an answer or the configured refusal phrase.
//!
//! - [`expansion`] - LLM query expansion with a strict line parser
//! - [`retrieval`] - candidate fan-out and order-preserving dedup merge
//! - [`context`] - context block assembly and grounded answer synthesis
//! - [`pipeline`] - the `answer(question)` orchestrator
//! - [`index`] - similarity index seam plus an in-memory cosine index
//! - [`embeddings`] / [`generation`] - external service clients with mocks
//! - [`chunker`] - overlapping document chunking for per-run index builds
//! - [`config`] / [`errors`] - configuration surface and error taxonomy
//!
//! # Example
//!
//! ```ignore
//! use answerforge::{AnswerPipeline, AppConfig};
//! use answerforge::embeddings::create_embedder;
//! use answerforge::generation::create_generation_client;
//! use answerforge::index::InMemoryIndex;
//! use std::sync::Arc;
//!
//! let config = AppConfig::load()?;
//! let embedder = create_embedder(&config.embedding)?;
//! let generation = create_generation_client(&config.generation)?;
//! let index = InMemoryIndex::build("manual", &text, &config.chunking, embedder.as_ref()).await?;
//!
//! let pipeline = AnswerPipeline::new(&config, generation, embedder, Arc::new(index));
//! let answer = pipeline.answer("Is there a topic about ergonomics?").await?;
//! ```

pub mod chunker;
pub mod config;
pub mod context;
pub mod embeddings;
pub mod errors;
pub mod expansion;
pub mod generation;
pub mod index;
pub mod pipeline;
pub mod prompt;
pub mod retrieval;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, ErrorKind, Result};
pub use pipeline::AnswerPipeline;
pub use retrieval::RetrievedPassage;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default refusal phrase returned when the context cannot support an answer
pub const DEFAULT_REFUSAL_MESSAGE: &str = "I don't know based on the provided context.";
