//! Query expansion
//!
//! One generation call turns the original question into semantically diverse
//! reformulations; a strict line parser turns the free-text reply into an
//! ordered candidate list. The parser is decoupled from the network call so
//! it can be tested on its own.

use crate::config::GenerationConfig;
use crate::errors::{AppError, Result};
use crate::generation::{ChatMessage, CompletionRequest, GenerationClient};
use crate::prompt;
use std::sync::Arc;
use tracing::warn;

/// Expands one question into candidate queries
pub struct QueryExpander {
    client: Arc<dyn GenerationClient>,
    model: String,
    temperature: f32,
    target_count: usize,
}

impl QueryExpander {
    /// Create an expander. `target_count` comes from
    /// `retrieval.candidate_query_target_count` configuration and is only a
    /// prompt hint.
    pub fn new(
        client: Arc<dyn GenerationClient>,
        generation: &GenerationConfig,
        target_count: usize,
    ) -> Self {
        Self {
            client,
            model: generation.model.clone(),
            temperature: generation.temperature,
            target_count,
        }
    }

    /// Expand the question into candidate queries, in generation-output
    /// order.
    ///
    /// The reply may carry more or fewer queries than the target; neither is
    /// enforced. An unparseable reply falls back to the original question as
    /// the sole candidate, so the pipeline never proceeds with zero
    /// candidates. Generation failures propagate.
    pub async fn expand(&self, question: &str) -> Result<Vec<String>> {
        let request = CompletionRequest {
            messages: vec![
                ChatMessage::system(
                    "You rewrite questions into diverse retrieval queries. \
                     Reply with one query per line and nothing else.",
                ),
                ChatMessage::user(prompt::expansion_prompt(question, self.target_count)),
            ],
            model: self.model.clone(),
            temperature: self.temperature,
        };

        let reply = self.client.complete(&request).await?;

        match parse_candidate_queries(&reply) {
            Ok(candidates) => Ok(candidates),
            Err(AppError::EmptyExpansion) => {
                warn!(
                    question = %question,
                    "Expansion reply had no usable queries, falling back to the original question"
                );
                Ok(vec![question.to_string()])
            }
            Err(e) => Err(e),
        }
    }
}

/// Parse a generation reply into candidate queries.
///
/// Delimiter rule: line boundaries. Trim rule: surrounding whitespace, then
/// a leading list marker (`1.`, `2)`, `-`, `*`) if present. Empty lines are
/// dropped. An empty result is an error so the caller can apply its
/// fallback.
pub fn parse_candidate_queries(reply: &str) -> Result<Vec<String>> {
    let candidates: Vec<String> = reply
        .lines()
        .map(strip_list_marker)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect();

    if candidates.is_empty() {
        return Err(AppError::EmptyExpansion);
    }

    Ok(candidates)
}

/// Strip a leading `1.` / `2)` / `-` / `*` list marker; a bare number line
/// is kept as-is.
fn strip_list_marker(line: &str) -> &str {
    let line = line.trim();

    let after_digits = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if after_digits.len() < line.len() {
        if let Some(rest) = after_digits
            .strip_prefix('.')
            .or_else(|| after_digits.strip_prefix(')'))
        {
            return rest.trim();
        }
        return line;
    }

    line.strip_prefix("- ")
        .or_else(|| line.strip_prefix("* "))
        .map(str::trim)
        .unwrap_or(line)
}
