//! Error types for credforge.
//!
//! Taxonomy (mirrors the run's failure-handling design):
//! - Transport faults: the generative service was unreachable or misbehaved.
//!   Retried with backoff inside the pipeline, never fatal.
//! - Persistence faults: the corpus could not be written. Propagate to the
//!   operator; silent loss of the corpus defeats the job's purpose.
//! - Validation and duplicate rejections are tallies, not errors, and do
//!   not appear here.

use thiserror::Error;

/// Top-level error type for credforge.
#[derive(Debug, Error)]
pub enum CredforgeError {
    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("OpenRouter API error: {0}")]
    OpenRouterApi(#[from] OpenRouterError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request timeout after {0:?}")]
    Timeout(std::time::Duration),

    #[error("Rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: f64 },

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV export error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// OpenRouter API specific errors.
#[derive(Debug, Error)]
pub enum OpenRouterError {
    #[error("Authentication failed: invalid API key")]
    AuthenticationFailed,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("API error (status {status}): {message}")]
    ApiError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Request failed after {attempts} attempts: {last_error}")]
    MaxRetriesExceeded { attempts: u32, last_error: String },
}

impl CredforgeError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// Result type alias for credforge.
pub type Result<T> = std::result::Result<T, CredforgeError>;
