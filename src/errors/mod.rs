//! Error types for the answer pipeline
//!
//! Provides:
//! - Distinct error types for generation, embedding, and retrieval failures
//! - A coarse kind classification for callers and logging
//! - Transience checks that drive bounded-backoff retry
//!
//! A content-based refusal is a normal answer, never an error; callers use
//! [`AppError::kind`] to tell a system failure apart from "no answer found".

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Coarse error classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Generation or embedding backend failure
    Service,
    /// Similarity index unavailable or errored
    Retrieval,
    /// Expansion reply empty or unparseable
    Parse,
    /// Invalid input at the pipeline boundary
    Validation,
    /// Configuration, serialization, or other internal failure
    Internal,
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Generation service errors
    #[error("Generation service error: {message}")]
    Generation { message: String },

    #[error("Generation request timed out after {timeout_ms}ms")]
    GenerationTimeout { timeout_ms: u64 },

    // Embedding service errors
    #[error("Embedding service error: {message}")]
    Embedding { message: String },

    // Shared backend failure modes
    #[error("Rate limited by {service} service")]
    RateLimited { service: String },

    #[error("Authentication rejected by {service} service")]
    Unauthorized { service: String },

    #[error("{service} service returned {status}: {message}")]
    Upstream {
        service: String,
        status: u16,
        message: String,
    },

    // Retrieval errors
    #[error("Retrieval failed: {message}")]
    Retrieval { message: String },

    // Expansion parsing
    #[error("Expansion reply contained no usable candidate queries")]
    EmptyExpansion,

    // Boundary validation
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    // Internal errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the kind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Generation { .. }
            | AppError::GenerationTimeout { .. }
            | AppError::Embedding { .. }
            | AppError::RateLimited { .. }
            | AppError::Unauthorized { .. }
            | AppError::Upstream { .. } => ErrorKind::Service,
            AppError::Retrieval { .. } => ErrorKind::Retrieval,
            AppError::EmptyExpansion => ErrorKind::Parse,
            AppError::Validation { .. } => ErrorKind::Validation,
            AppError::Configuration { .. }
            | AppError::HttpClient(_)
            | AppError::Serialization(_)
            | AppError::Other(_) => ErrorKind::Internal,
        }
    }

    /// Whether a retry with backoff may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::RateLimited { .. }
            | AppError::GenerationTimeout { .. }
            | AppError::Upstream { .. } => true,
            AppError::HttpClient(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Configuration {
            message: err.to_string(),
        }
    }
}
