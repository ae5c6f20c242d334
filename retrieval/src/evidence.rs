//! The evidence model handed to answer generation.

use claim_chunking::{Chunk, Page};
use serde::{Deserialize, Serialize};

/// What a piece of evidence refers to: a raw chunk, or a whole page
/// that absorbed a cluster of its own chunks during auto-merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceSource {
    Chunk(Chunk),
    Page(Page),
}

/// One piece of evidence plus the score that justified its inclusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub source: EvidenceSource,
    pub score: f32,
}

impl EvidenceItem {
    pub fn from_chunk(chunk: Chunk, score: f32) -> Self {
        Self {
            source: EvidenceSource::Chunk(chunk),
            score,
        }
    }

    pub fn from_page(page: Page, score: f32) -> Self {
        Self {
            source: EvidenceSource::Page(page),
            score,
        }
    }

    /// Id of the underlying page, whichever level the evidence is at.
    pub fn page_id(&self) -> &str {
        match &self.source {
            EvidenceSource::Chunk(chunk) => &chunk.parent_id,
            EvidenceSource::Page(page) => &page.id,
        }
    }

    /// Section header inherited from the page.
    pub fn header(&self) -> &str {
        match &self.source {
            EvidenceSource::Chunk(chunk) => &chunk.header,
            EvidenceSource::Page(page) => &page.header,
        }
    }

    /// The evidence text itself.
    pub fn text(&self) -> &str {
        match &self.source {
            EvidenceSource::Chunk(chunk) => &chunk.text,
            EvidenceSource::Page(page) => &page.text,
        }
    }

    /// Whether this item is a page that absorbed merged chunks (or was
    /// selected whole on the summary route).
    pub fn is_page(&self) -> bool {
        matches!(self.source, EvidenceSource::Page(_))
    }
}

/// An ordered sequence of evidence items. By construction it never
/// contains both a merged page and any of the chunks that were merged
/// into it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvidenceSet {
    items: Vec<EvidenceItem>,
}

impl EvidenceSet {
    pub fn new(items: Vec<EvidenceItem>) -> Self {
        Self { items }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[EvidenceItem] {
        &self.items
    }

    pub fn iter(&self) -> impl Iterator<Item = &EvidenceItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of chunk-level items.
    pub fn chunk_count(&self) -> usize {
        self.items.iter().filter(|i| !i.is_page()).count()
    }

    /// Number of page-level items.
    pub fn page_count(&self) -> usize {
        self.items.iter().filter(|i| i.is_page()).count()
    }

    /// Whether any item references the given page, at either level.
    pub fn touches_page(&self, page_id: &str) -> bool {
        self.items.iter().any(|i| i.page_id() == page_id)
    }
}
