//! # Claim Chunking
//!
//! This crate owns the document side of the claim retrieval system: the
//! strongly typed page and chunk records, the hierarchical chunker that
//! splits a page into overlapping child segments, and the parent/child
//! store that keeps both levels linked.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                       Document Layer                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  Page ──► HierarchicalChunker ──► Chunk (overlapping children)  │
//! │    │                                 │                          │
//! │    └────────────► PageStore ◄────────┘                          │
//! │                  (referential integrity, chunk ordering)        │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Pages are created once by an ingestion collaborator and are immutable
//! afterwards. Chunks are derived deterministically from their parent
//! page, so re-chunking the same page always yields the same ids and the
//! same content.

pub mod chunk;
pub mod chunker;
pub mod error;
pub mod page;
pub mod store;

pub use chunk::{Chunk, chunk_id};
pub use chunker::{ChunkerConfig, HierarchicalChunker};
pub use error::{ChunkingError, Result};
pub use page::{Page, PageKind};
pub use store::PageStore;
