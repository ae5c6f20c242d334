//! Error types for the embedding layer.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type Result<T> = std::result::Result<T, EmbeddingError>;

/// Errors that can occur in the embedding layer.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Provider not configured (missing API key, etc.).
    #[error("embedding provider not configured")]
    ProviderNotConfigured,

    /// API request failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// Invalid response from provider.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    /// Vector index temporarily unreachable.
    #[error("index unavailable: {0}")]
    IndexUnavailable(String),

    /// Embedding dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Top-k below the minimum of 1.
    #[error("invalid top-k: {k} (must be at least 1)")]
    InvalidTopK { k: usize },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

impl EmbeddingError {
    /// Whether the failure is transient: safe to retry with backoff,
    /// or to reroute through the fallback write path. Everything else
    /// is fatal for the operation that produced it.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. } | Self::IndexUnavailable(_) | Self::Http(_)
        )
    }
}
