//! Grounded answer synthesis
//!
//! Composes the grounded prompt and runs one generation call, returning the
//! reply verbatim with no post-processing. An empty context short-circuits
//! to the configured refusal phrase without invoking the service, keeping
//! the refusal byte-stable.

use crate::config::{AnswerConfig, GenerationConfig};
use crate::errors::Result;
use crate::generation::{ChatMessage, CompletionRequest, GenerationClient};
use crate::prompt;
use std::sync::Arc;
use tracing::debug;

/// Generates a grounded answer or the refusal phrase
pub struct AnswerSynthesizer {
    client: Arc<dyn GenerationClient>,
    model: String,
    temperature: f32,
    refusal_message: String,
}

impl AnswerSynthesizer {
    /// Create a synthesizer. The model and temperature come from
    /// `generation` configuration, the refusal phrase from
    /// `answer.refusal_message`.
    pub fn new(
        client: Arc<dyn GenerationClient>,
        generation: &GenerationConfig,
        answer: &AnswerConfig,
    ) -> Self {
        Self {
            client,
            model: generation.model.clone(),
            temperature: generation.temperature,
            refusal_message: answer.refusal_message.clone(),
        }
    }

    /// Answer the question from the context, or refuse.
    ///
    /// With a non-empty context the generation service is invoked exactly
    /// once and its reply returned unmodified; the refusal contract then
    /// lives in the prompt. Service failures propagate.
    pub async fn synthesize(&self, question: &str, context: &str) -> Result<String> {
        if context.trim().is_empty() {
            debug!(
                question = %question,
                "Empty context, returning refusal without a generation call"
            );
            return Ok(self.refusal_message.clone());
        }

        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(
                    "You are a careful assistant that answers strictly from the supplied context.",
                ),
                ChatMessage::user(prompt::grounded_answer_prompt(
                    context,
                    question,
                    &self.refusal_message,
                )),
            ],
            model: self.model.clone(),
            temperature: self.temperature,
        };

        self.client.complete(&request).await
    }

    /// The configured refusal phrase
    pub fn refusal_message(&self) -> &str {
        &self.refusal_message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::MockGeneration;

    fn synthesizer(client: MockGeneration) -> AnswerSynthesizer {
        AnswerSynthesizer::new(
            Arc::new(client),
            &GenerationConfig::default(),
            &AnswerConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_empty_context_returns_exact_refusal() {
        // The script would answer if called; it must not be.
        let s = synthesizer(MockGeneration::always("a fabricated answer"));

        let answer = s.synthesize("Any question?", "").await.unwrap();
        assert_eq!(answer, crate::DEFAULT_REFUSAL_MESSAGE);

        let answer = s.synthesize("Any question?", "   \n ").await.unwrap();
        assert_eq!(answer, crate::DEFAULT_REFUSAL_MESSAGE);
    }

    #[tokio::test]
    async fn test_reply_is_returned_verbatim() {
        let s = synthesizer(MockGeneration::always("  reply with odd spacing \n"));
        let answer = s.synthesize("Question?", "Some context.").await.unwrap();
        assert_eq!(answer, "  reply with odd spacing \n");
    }

    #[tokio::test]
    async fn test_service_failure_propagates() {
        let s = synthesizer(MockGeneration::with_script(vec![]));
        assert!(s.synthesize("Question?", "Some context.").await.is_err());
    }
}
