//! Pipeline orchestration
//!
//! Four-stage straight-line flow: expand the question, fan out retrieval
//! across candidate queries, merge with dedup, and synthesize a grounded
//! answer. Retrieval fan-out runs concurrently through an order-preserving
//! buffered stream, so results reach the aggregator in candidate-query
//! order regardless of completion order and the first-seen dedup tie-break
//! stays deterministic under network jitter.
//!
//! Nothing outlives a single `answer()` call; there is no cross-call cache
//! or state.

use crate::config::{AppConfig, FailureMode};
use crate::context::{format_context, AnswerSynthesizer};
use crate::embeddings::Embedder;
use crate::errors::{AppError, Result};
use crate::expansion::QueryExpander;
use crate::generation::GenerationClient;
use crate::index::SimilarityIndex;
use crate::retrieval::{CandidateRetriever, ResultAggregator, RetrievedPassage};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// The `answer(question)` orchestrator
pub struct AnswerPipeline {
    expander: QueryExpander,
    retriever: CandidateRetriever,
    aggregator: ResultAggregator,
    synthesizer: AnswerSynthesizer,
    failure_mode: FailureMode,
    max_concurrent_retrievals: usize,
}

impl AnswerPipeline {
    /// Wire the stages from configuration and the three external seams.
    pub fn new(
        config: &AppConfig,
        generation: Arc<dyn GenerationClient>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn SimilarityIndex>,
    ) -> Self {
        Self {
            expander: QueryExpander::new(
                generation.clone(),
                &config.generation,
                config.retrieval.candidate_query_target_count,
            ),
            retriever: CandidateRetriever::new(
                embedder,
                index,
                config.retrieval.passages_per_query,
            ),
            aggregator: ResultAggregator::new(config.retrieval.final_context_limit),
            synthesizer: AnswerSynthesizer::new(generation, &config.generation, &config.answer),
            // `retrieval.failure_mode` configuration: fail-fast by default,
            // partial results only as an explicit opt-in
            failure_mode: config.retrieval.failure_mode,
            // `retrieval.max_concurrent_retrievals` configuration bounds the
            // fan-out worker pool
            max_concurrent_retrievals: config.retrieval.max_concurrent_retrievals.max(1),
        }
    }

    /// Answer one question against the corpus.
    ///
    /// Returns either a grounded answer or the configured refusal phrase.
    /// Service and retrieval failures surface as errors, distinct from a
    /// refusal.
    pub async fn answer(&self, question: &str) -> Result<String> {
        let start = Instant::now();

        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation {
                message: "Question must not be empty".to_string(),
                field: Some("question".to_string()),
            });
        }

        let passages = self.collect_context(question).await?;
        let context = format_context(&passages);
        let answer = self.synthesizer.synthesize(question, &context).await?;

        info!(
            question = %question,
            passages = passages.len(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Question answered"
        );

        Ok(answer)
    }

    /// Expand, fan out, and merge. Exposed so retrieval quality can be
    /// inspected without spending a generation call on the final answer.
    pub async fn collect_context(&self, question: &str) -> Result<Vec<RetrievedPassage>> {
        let candidates = self.expander.expand(question).await?;
        debug!(candidates = candidates.len(), "Question expanded");

        let batches = self.fan_out(&candidates).await?;
        Ok(self.aggregator.merge(batches))
    }

    /// Run all candidate retrievals concurrently, joined back in
    /// candidate-query order.
    async fn fan_out(&self, candidates: &[String]) -> Result<Vec<Vec<RetrievedPassage>>> {
        match self.failure_mode {
            FailureMode::FailFast => {
                stream::iter(candidates.iter().map(|query| self.retriever.retrieve(query)))
                    .buffered(self.max_concurrent_retrievals)
                    .try_collect()
                    .await
            }
            FailureMode::PartialResults => {
                let results: Vec<Result<Vec<RetrievedPassage>>> =
                    stream::iter(candidates.iter().map(|query| self.retriever.retrieve(query)))
                        .buffered(self.max_concurrent_retrievals)
                        .collect()
                        .await;

                let mut batches = Vec::with_capacity(results.len());
                let mut first_error = None;

                for (query, result) in candidates.iter().zip(results) {
                    match result {
                        Ok(batch) => batches.push(batch),
                        Err(e) => {
                            warn!(
                                query = %query,
                                error = %e,
                                "Candidate retrieval failed, continuing with remaining candidates"
                            );
                            if first_error.is_none() {
                                first_error = Some(e);
                            }
                        }
                    }
                }

                // A fully-failed fan-out is still a system failure
                if batches.is_empty() {
                    if let Some(e) = first_error {
                        return Err(e);
                    }
                }

                Ok(batches)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetrievalConfig;
    use crate::embeddings::MockEmbedder;
    use crate::errors::ErrorKind;
    use crate::generation::MockGeneration;
    use crate::index::InMemoryIndex;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const ERGONOMICS_CHUNK: &str = "Ergonomics in chair design is of essential importance.";

    async fn furniture_index(embedder: &MockEmbedder) -> InMemoryIndex {
        let mut index = InMemoryIndex::new();
        for (i, content) in [
            ERGONOMICS_CHUNK,
            "Wood veneer finishes require periodic oiling.",
            "Flat-pack assembly reduces shipping volume.",
        ]
        .iter()
        .enumerate()
        {
            let embedding = embedder.embed(content).await.unwrap();
            index.insert("furniture-design", i as i32, content, embedding);
        }
        index
    }

    fn build_pipeline(
        config: &AppConfig,
        script: Vec<&str>,
        embedder: Arc<MockEmbedder>,
        index: Arc<dyn SimilarityIndex>,
    ) -> AnswerPipeline {
        let generation = Arc::new(MockGeneration::with_script(
            script.into_iter().map(String::from).collect(),
        ));
        AnswerPipeline::new(config, generation, embedder, index)
    }

    /// Index wrapper whose first lookup fails
    struct FlakyIndex {
        inner: InMemoryIndex,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl SimilarityIndex for FlakyIndex {
        async fn query(&self, embedding: &[f32], k: usize) -> Result<Vec<RetrievedPassage>> {
            if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                return Err(AppError::Retrieval {
                    message: "index briefly unavailable".to_string(),
                });
            }
            self.inner.query(embedding, k).await
        }
    }

    #[tokio::test]
    async fn test_context_contains_verbatim_answer_chunk() {
        let embedder = Arc::new(MockEmbedder::new(512));
        let index = Arc::new(furniture_index(&embedder).await);
        let config = AppConfig::default();

        let pipeline = build_pipeline(
            &config,
            vec!["ergonomics in chair design\nimportance of ergonomics for chairs"],
            embedder,
            index,
        );

        let passages = pipeline
            .collect_context("Is there a topic about ergonomics?")
            .await
            .unwrap();

        assert!(passages.iter().any(|p| p.content == ERGONOMICS_CHUNK));
    }

    #[tokio::test]
    async fn test_on_topic_question_is_answered() {
        let embedder = Arc::new(MockEmbedder::new(512));
        let index = Arc::new(furniture_index(&embedder).await);
        let config = AppConfig::default();

        let pipeline = build_pipeline(
            &config,
            vec![
                "ergonomics in chair design\nimportance of ergonomics for chairs",
                "Yes, the corpus covers ergonomics: it is of essential importance in chair design.",
            ],
            embedder,
            index,
        );

        let answer = pipeline
            .answer("Is there a topic about ergonomics?")
            .await
            .unwrap();

        assert!(answer.contains("ergonomics"));
        assert_ne!(answer, crate::DEFAULT_REFUSAL_MESSAGE);
    }

    #[tokio::test]
    async fn test_off_corpus_question_returns_exact_refusal() {
        let embedder = Arc::new(MockEmbedder::new(512));
        let index = Arc::new(furniture_index(&embedder).await);
        let config = AppConfig::default();

        let pipeline = build_pipeline(
            &config,
            vec![
                "capital of France\nwhich city is the French capital",
                crate::DEFAULT_REFUSAL_MESSAGE,
            ],
            embedder,
            index,
        );

        let answer = pipeline.answer("What is the capital of France?").await.unwrap();
        assert_eq!(answer, crate::DEFAULT_REFUSAL_MESSAGE);
    }

    #[tokio::test]
    async fn test_empty_corpus_short_circuits_to_refusal() {
        let embedder = Arc::new(MockEmbedder::new(512));
        let index = Arc::new(InMemoryIndex::new());
        let config = AppConfig::default();

        // Only the expansion reply is scripted; a second generation call
        // would error, so success proves none was made.
        let pipeline = build_pipeline(
            &config,
            vec!["some query\nanother query"],
            embedder,
            index,
        );

        let answer = pipeline.answer("Anything at all?").await.unwrap();
        assert_eq!(answer, crate::DEFAULT_REFUSAL_MESSAGE);
    }

    #[tokio::test]
    async fn test_unparseable_expansion_falls_back_to_question() {
        let embedder = Arc::new(MockEmbedder::new(512));
        let index = Arc::new(furniture_index(&embedder).await);
        let config = AppConfig::default();

        let pipeline = build_pipeline(
            &config,
            vec!["\n \n", "Chair ergonomics matters a great deal."],
            embedder,
            index,
        );

        let answer = pipeline
            .answer("Is there a topic about ergonomics?")
            .await
            .unwrap();
        assert_eq!(answer, "Chair ergonomics matters a great deal.");
    }

    #[tokio::test]
    async fn test_context_never_exceeds_limit() {
        let embedder = Arc::new(MockEmbedder::new(512));
        let mut index = InMemoryIndex::new();
        for (i, content) in [
            "Upholstery fabric choice drives durability.",
            "Lumbar support height should be adjustable.",
            "Armrest padding reduces contact pressure.",
            "Seat depth affects circulation in long sittings.",
            "Caster wheels must match the floor surface.",
            "Backrest recline angle changes spinal load.",
        ]
        .iter()
        .enumerate()
        {
            let embedding = embedder.embed(content).await.unwrap();
            index.insert("furniture-design", i as i32, content, embedding);
        }

        let config = AppConfig::default();
        assert_eq!(config.retrieval.final_context_limit, 2);

        let pipeline = build_pipeline(
            &config,
            vec!["seat comfort\nback support\nchair adjustability"],
            embedder,
            Arc::new(index),
        );

        let passages = pipeline
            .collect_context("What makes a chair comfortable?")
            .await
            .unwrap();
        assert!(passages.len() <= 2);
    }

    #[tokio::test]
    async fn test_fail_fast_aborts_on_retrieval_failure() {
        let embedder = Arc::new(MockEmbedder::new(512));
        let inner = furniture_index(&embedder).await;
        let index = Arc::new(FlakyIndex {
            inner,
            calls: AtomicUsize::new(0),
        });

        let config = AppConfig {
            retrieval: RetrievalConfig {
                max_concurrent_retrievals: 1,
                ..RetrievalConfig::default()
            },
            ..AppConfig::default()
        };

        let pipeline = build_pipeline(
            &config,
            vec!["first query\nsecond query"],
            embedder,
            index,
        );

        let err = pipeline.answer("Any question?").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Retrieval);
    }

    #[tokio::test]
    async fn test_partial_results_mode_continues_past_failure() {
        let embedder = Arc::new(MockEmbedder::new(512));
        let inner = furniture_index(&embedder).await;
        let index = Arc::new(FlakyIndex {
            inner,
            calls: AtomicUsize::new(0),
        });

        let config = AppConfig {
            retrieval: RetrievalConfig {
                max_concurrent_retrievals: 1,
                failure_mode: FailureMode::PartialResults,
                ..RetrievalConfig::default()
            },
            ..AppConfig::default()
        };

        let pipeline = build_pipeline(
            &config,
            vec![
                "chair ergonomics\nergonomic chair design",
                "Answered from the surviving candidate.",
            ],
            embedder,
            index,
        );

        let answer = pipeline.answer("Is there a topic about ergonomics?").await.unwrap();
        assert_eq!(answer, "Answered from the surviving candidate.");
    }

    #[tokio::test]
    async fn test_blank_question_is_rejected() {
        let embedder = Arc::new(MockEmbedder::new(512));
        let index = Arc::new(InMemoryIndex::new());
        let config = AppConfig::default();

        let pipeline = build_pipeline(&config, vec![], embedder, index);

        let err = pipeline.answer("   ").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
