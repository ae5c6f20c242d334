//! # Claim Embeddings
//!
//! Embedding generation and nearest-neighbor lookup for the claim
//! retrieval system.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Embedding Layer                             │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  EmbeddingProvider ──► Embedding ──► VectorIndex               │
//! │       │                                  │                      │
//! │       ▼                                  ▼                      │
//! │  OpenAI / CachedProvider        InMemoryIndex / TieredIndex    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `VectorIndex` trait is the abstract capability the retrieval
//! core depends on; the backing technology is a deployment concern.
//! Two independent instances exist at runtime: a chunk-level index and
//! a summary-level index.

pub mod cache;
pub mod error;
pub mod index;
pub mod provider;
pub mod similarity;

pub use cache::{CachedProvider, EmbeddingCache};
pub use error::{EmbeddingError, Result};
pub use index::{InMemoryIndex, RetrievalCandidate, TieredIndex, VectorIndex};
pub use provider::{EmbeddingProvider, OpenAIProvider};
pub use similarity::cosine_similarity;

/// A dense vector embedding.
pub type Embedding = Vec<f32>;

/// Default embedding dimension (OpenAI text-embedding-3-small).
pub const DEFAULT_DIMENSION: usize = 1536;
