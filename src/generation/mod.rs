//! Generation service abstraction
//!
//! A completion request is an ordered list of role/content turns plus model
//! parameters; the reply is the completion text, returned verbatim. The
//! scripted mock makes pipeline tests deterministic without network access.

use crate::config::GenerationConfig;
use crate::errors::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::warn;

/// One turn in a completion request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A single completion request
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    /// Model identifier, from `generation.model` configuration
    pub model: String,
    /// Sampling temperature, from `generation.temperature` configuration
    pub temperature: f32,
}

/// Trait for completion generation
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Run one completion and return the reply text verbatim
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;
}

/// OpenAI-compatible chat completion client
pub struct OpenAIGeneration {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    timeout_ms: u64,
    max_retries: u32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

impl OpenAIGeneration {
    /// Create a new generation client from configuration
    pub fn new(config: &GenerationConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AppError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().unwrap_or_default(),
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            timeout_ms: config.timeout_secs * 1000,
            max_retries: config.max_retries,
        })
    }

    async fn request_once(&self, request: &CompletionRequest) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = ChatRequest {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AppError::GenerationTimeout {
                        timeout_ms: self.timeout_ms,
                    }
                } else {
                    AppError::from(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status.as_u16() {
                429 => AppError::RateLimited {
                    service: "generation".to_string(),
                },
                401 | 403 => AppError::Unauthorized {
                    service: "generation".to_string(),
                },
                s if status.is_server_error() => AppError::Upstream {
                    service: "generation".to_string(),
                    status: s,
                    message: body,
                },
                _ => AppError::Generation {
                    message: format!("API error {}: {}", status, body),
                },
            });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| AppError::Generation {
            message: format!("Failed to parse response: {}", e),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AppError::Generation {
                message: "Empty response".to_string(),
            })
    }
}

#[async_trait]
impl GenerationClient for OpenAIGeneration {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        // Bounded retry on transient failures; `generation.max_retries`
        // configuration caps the attempts.
        let mut attempt = 0;
        loop {
            match self.request_once(request).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = Duration::from_millis(100 * 2_u64.pow(attempt));
                    warn!(
                        attempt = attempt,
                        max_retries = self.max_retries,
                        error = %e,
                        "Generation request failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Scripted generation client for tests
///
/// Replies are popped in call order; when the script runs dry the fallback
/// reply is returned, or an error if none was configured.
pub struct MockGeneration {
    script: Mutex<VecDeque<String>>,
    fallback: Option<String>,
}

impl MockGeneration {
    /// Always reply with the same text
    pub fn always(reply: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Some(reply.into()),
        }
    }

    /// Reply with each script entry in call order
    pub fn with_script(replies: Vec<String>) -> Self {
        Self {
            script: Mutex::new(replies.into()),
            fallback: None,
        }
    }
}

#[async_trait]
impl GenerationClient for MockGeneration {
    async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
        if let Some(reply) = self.script.lock().unwrap().pop_front() {
            return Ok(reply);
        }
        self.fallback
            .clone()
            .ok_or_else(|| AppError::Generation {
                message: "Mock generation script exhausted".to_string(),
            })
    }
}

/// Create a generation client based on configuration
pub fn create_generation_client(config: &GenerationConfig) -> Result<Arc<dyn GenerationClient>> {
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAIGeneration::new(config)?)),
        "mock" => Ok(Arc::new(MockGeneration::always(String::new()))),
        other => Err(AppError::Configuration {
            message: format!("Unknown generation provider: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            messages: vec![ChatMessage::user("hello")],
            model: "gpt-4o-mini".to_string(),
            temperature: 0.0,
        }
    }

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let client = MockGeneration::with_script(vec!["first".to_string(), "second".to_string()]);
        assert_eq!(client.complete(&request()).await.unwrap(), "first");
        assert_eq!(client.complete(&request()).await.unwrap(), "second");
        assert!(client.complete(&request()).await.is_err());
    }

    #[tokio::test]
    async fn test_always_reply() {
        let client = MockGeneration::always("same");
        assert_eq!(client.complete(&request()).await.unwrap(), "same");
        assert_eq!(client.complete(&request()).await.unwrap(), "same");
    }

    #[test]
    fn test_chat_message_roles() {
        assert_eq!(ChatMessage::system("x").role, "system");
        assert_eq!(ChatMessage::user("x").role, "user");
    }
}
