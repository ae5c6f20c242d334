//! Error types for the retrieval engine.

use thiserror::Error;

/// Result type alias for retrieval operations.
pub type Result<T> = std::result::Result<T, RetrievalError>;

/// Errors that can occur in the retrieval engine.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// Auto-merge threshold of 1 or less would merge on any single
    /// hit, defeating needle-level precision. Rejected at construction.
    #[error("invalid auto-merge threshold {0}: must be greater than 1")]
    InvalidThreshold(usize),

    /// Configuration rejected at construction.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A summary referenced a page the store does not know about.
    #[error("unknown page: {0}")]
    UnknownPage(String),

    /// Document layer error.
    #[error("chunking error: {0}")]
    Chunking(#[from] claim_chunking::ChunkingError),

    /// Embedding layer error.
    #[error("embedding error: {0}")]
    Embedding(#[from] claim_embeddings::EmbeddingError),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
