//! Error types for the document layer.

use thiserror::Error;

/// Result type alias for chunking and store operations.
pub type Result<T> = std::result::Result<T, ChunkingError>;

/// Errors that can occur in the document layer.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// A chunk referenced a parent page the store does not know about.
    /// The write that produced it is rejected as a whole.
    #[error("orphan chunk {chunk_id}: unknown parent page {parent_id}")]
    OrphanChunk { chunk_id: String, parent_id: String },

    /// Page lookup failed.
    #[error("page not found: {0}")]
    PageNotFound(String),

    /// Chunker configuration rejected at construction.
    #[error("invalid chunker configuration: {0}")]
    InvalidConfig(String),

    /// Document store persistence failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
