//! Configuration management for the answer pipeline
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default.toml, config/{env}.toml)
//! - Default values
//!
//! Every option is documented at the call site that consumes it; this module
//! only owns loading, defaulting, and validation of the surface.

use crate::chunker::ChunkingConfig;
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Generation service configuration
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Embedding service configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Fan-out retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,

    /// Answer synthesis configuration
    #[serde(default)]
    pub answer: AnswerConfig,

    /// Document chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GenerationConfig {
    /// Provider: openai, mock
    #[serde(default = "default_generation_provider")]
    pub provider: String,

    /// Model identifier passed on every completion request
    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// API key for the generation service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_service_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    /// Provider: openai, mock
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    /// Model to use
    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Embedding dimension
    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// API key for the embedding service
    pub api_key: Option<String>,

    /// API base URL (for custom endpoints)
    pub api_base: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_service_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on transient failures
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    /// How many candidate reformulations to request (a prompt hint, not a
    /// hard bound)
    #[serde(default = "default_candidate_query_target_count")]
    pub candidate_query_target_count: usize,

    /// Passages fetched per candidate query (fan-out width k)
    #[serde(default = "default_passages_per_query")]
    pub passages_per_query: usize,

    /// Maximum passages in the final deduplicated context (N)
    #[serde(default = "default_final_context_limit")]
    pub final_context_limit: usize,

    /// Upper bound on concurrently running retrieval calls
    #[serde(default = "default_max_concurrent_retrievals")]
    pub max_concurrent_retrievals: usize,

    /// What to do when a candidate retrieval fails
    #[serde(default)]
    pub failure_mode: FailureMode,
}

/// Failure policy for the retrieval fan-out
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FailureMode {
    /// Any retrieval failure aborts the question
    #[default]
    FailFast,
    /// Proceed with whichever candidate queries succeeded
    PartialResults,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AnswerConfig {
    /// Fixed phrase returned when the context cannot support an answer
    #[serde(default = "default_refusal_message")]
    pub refusal_message: String,
}

// Default value functions
fn default_generation_provider() -> String {
    "openai".to_string()
}
fn default_generation_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_embedding_provider() -> String {
    "openai".to_string()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_embedding_dimension() -> usize {
    1536
}
fn default_service_timeout() -> u64 {
    30
}
fn default_max_retries() -> u32 {
    3
}
fn default_candidate_query_target_count() -> usize {
    5
}
fn default_passages_per_query() -> usize {
    2
}
fn default_final_context_limit() -> usize {
    2
}
fn default_max_concurrent_retrievals() -> usize {
    4
}
fn default_refusal_message() -> String {
    crate::DEFAULT_REFUSAL_MESSAGE.to_string()
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let config = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__RETRIEVAL__PASSAGES_PER_QUERY=4
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load from a specific TOML file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get the generation request timeout as Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation.timeout_secs)
    }

    /// Get the embedding request timeout as Duration
    pub fn embedding_timeout(&self) -> Duration {
        Duration::from_secs(self.embedding.timeout_secs)
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_generation_provider(),
            model: default_generation_model(),
            temperature: default_temperature(),
            api_key: None,
            api_base: None,
            timeout_secs: default_service_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            api_key: None,
            api_base: None,
            timeout_secs: default_service_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            candidate_query_target_count: default_candidate_query_target_count(),
            passages_per_query: default_passages_per_query(),
            final_context_limit: default_final_context_limit(),
            max_concurrent_retrievals: default_max_concurrent_retrievals(),
            failure_mode: FailureMode::default(),
        }
    }
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            refusal_message: default_refusal_message(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            generation: GenerationConfig::default(),
            embedding: EmbeddingConfig::default(),
            retrieval: RetrievalConfig::default(),
            answer: AnswerConfig::default(),
            chunking: ChunkingConfig::default(),
        }
    }
}
