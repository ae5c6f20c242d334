//! Chunk records: the fine-grained retrieval unit.

use serde::{Deserialize, Serialize};

use crate::page::{Page, PageKind};

/// Deterministic chunk id derived from the parent id and the chunk's
/// position within the page.
pub fn chunk_id(parent_id: &str, chunk_index: usize) -> String {
    format!("{parent_id}_chunk_{chunk_index}")
}

/// A small segment of a page's text, carrying a copy of its parent's
/// metadata so a vector hit is self-describing.
///
/// Chunks are produced once by the [`crate::HierarchicalChunker`] and
/// are immutable; they are many-to-one with [`Page`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Chunk {
    /// `{parent_id}_chunk_{chunk_index}`.
    pub id: String,

    /// Id of the owning page. Must resolve in the store.
    pub parent_id: String,

    /// Zero-based, dense position within the parent page.
    pub chunk_index: usize,

    /// Whitespace-trimmed, non-empty segment text.
    pub text: String,

    /// Character count of `text`.
    pub size: usize,

    // Metadata inherited from the parent at creation time.
    pub page_number: u32,
    pub header: String,
    pub date: String,
    pub involved_parties: Vec<String>,
    pub kind: PageKind,
}

impl Chunk {
    /// Create a chunk from a parent page and its position in the page.
    pub fn new(page: &Page, chunk_index: usize, text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            id: chunk_id(&page.id, chunk_index),
            parent_id: page.id.clone(),
            chunk_index,
            size: text.chars().count(),
            text,
            page_number: page.page_number,
            header: page.header.clone(),
            date: page.date.clone(),
            involved_parties: page.involved_parties.clone(),
            kind: page.kind,
        }
    }
}
