//! # Claim Retrieval
//!
//! The retrieval engine for natural-language questions over a claim
//! document. Each query is classified into one of two strategies and
//! the matching path assembles an evidence set for the (external)
//! answer-generation service.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Retrieval Engine                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  query ──► QueryRouter ──┬─► needle:  chunk index ──► AutoMerge │
//! │                          │                             Resolver │
//! │                          └─► summary: summary index ──► Summary │
//! │                                                        Selector │
//! │                          │                                      │
//! │                          ▼                                      │
//! │                     EvidenceSet (+ route, for observability)    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Indexing is a separate, write-heavy batch phase: pages are chunked
//! into the document store, then embedded and upserted into the vector
//! indexes as independent bounded-concurrency units. Retrieval is
//! read-only, so concurrent queries run fully in parallel.

pub mod config;
pub mod engine;
pub mod error;
pub mod evidence;
pub mod resolver;
pub mod router;
pub mod summary;

pub use config::EngineConfig;
pub use engine::{IndexReport, PageSummary, Retrieval, RetrievalEngine, RetrievalEngineBuilder};
pub use error::{Result, RetrievalError};
pub use evidence::{EvidenceItem, EvidenceSet, EvidenceSource};
pub use resolver::AutoMergeResolver;
pub use router::{KeywordRouter, QueryRouter, RouteDecision};
pub use summary::SummarySelector;

// Re-export from dependencies for convenience
pub use claim_chunking::{Chunk, Page, PageKind, PageStore};
pub use claim_embeddings::{
    EmbeddingProvider, InMemoryIndex, RetrievalCandidate, TieredIndex, VectorIndex,
};
