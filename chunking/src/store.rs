//! Parent/child document store.
//!
//! The `PageStore` owns pages (parents) and chunks (children) and
//! enforces the referential invariant at write time: a chunk batch that
//! references an unknown page is rejected as a whole. Pages are
//! write-once in spirit; re-writing the same id is an upsert that
//! atomically replaces the page content and drops its previous chunk
//! set, so a re-index never leaves stale children behind.
//!
//! The store is not internally locked. Query-time access is read-only,
//! so callers that interleave indexing and retrieval wrap it in an
//! `Arc<RwLock<_>>`.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{debug, info};

use crate::chunk::Chunk;
use crate::error::{ChunkingError, Result};
use crate::page::{Page, PageKind};

/// In-memory parent/child store with optional JSON persistence.
#[derive(Debug, Default)]
pub struct PageStore {
    pages: HashMap<String, Page>,
    chunks: HashMap<String, Chunk>,
}

/// On-disk snapshot shape for [`PageStore::load`].
#[derive(Serialize, Deserialize)]
struct StoreSnapshot {
    pages: Vec<Page>,
    chunks: Vec<Chunk>,
}

#[derive(Serialize)]
struct StoreSnapshotRef<'a> {
    pages: Vec<&'a Page>,
    chunks: Vec<&'a Chunk>,
}

impl PageStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a page. Replacing drops the page's previous
    /// chunk set so readers never observe a mix of old and new children.
    pub fn put_page(&mut self, page: Page) {
        let had_chunks = self.chunks.values().any(|c| c.parent_id == page.id);
        if had_chunks {
            self.chunks.retain(|_, c| c.parent_id != page.id);
            debug!(page = %page.id, "replaced page; dropped stale chunks");
        }
        self.pages.insert(page.id.clone(), page);
    }

    /// Look up a page by id.
    pub fn get_page(&self, id: &str) -> Option<&Page> {
        self.pages.get(id)
    }

    /// Look up a page by id, failing with `PageNotFound`.
    pub fn require_page(&self, id: &str) -> Result<&Page> {
        self.pages
            .get(id)
            .ok_or_else(|| ChunkingError::PageNotFound(id.to_string()))
    }

    /// Write a batch of chunks. The write is all-or-nothing: if any
    /// chunk references an unknown parent the whole batch is rejected
    /// with `OrphanChunk`. Writes are idempotent by chunk id.
    pub fn put_chunks(&mut self, chunks: Vec<Chunk>) -> Result<()> {
        for chunk in &chunks {
            if !self.pages.contains_key(&chunk.parent_id) {
                return Err(ChunkingError::OrphanChunk {
                    chunk_id: chunk.id.clone(),
                    parent_id: chunk.parent_id.clone(),
                });
            }
        }
        for chunk in chunks {
            self.chunks.insert(chunk.id.clone(), chunk);
        }
        Ok(())
    }

    /// Look up a chunk by id.
    pub fn get_chunk(&self, id: &str) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    /// All chunks of a parent page, ordered by `chunk_index`.
    pub fn chunks_by_parent(&self, parent_id: &str) -> Vec<&Chunk> {
        let mut children: Vec<&Chunk> = self
            .chunks
            .values()
            .filter(|c| c.parent_id == parent_id)
            .collect();
        children.sort_by_key(|c| c.chunk_index);
        children
    }

    /// All `Overview` pages, ordered by page number.
    pub fn overview_pages(&self) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self
            .pages
            .values()
            .filter(|p| p.kind == PageKind::Overview)
            .collect();
        pages.sort_by_key(|p| p.page_number);
        pages
    }

    /// All pages, ordered by page number.
    pub fn pages(&self) -> Vec<&Page> {
        let mut pages: Vec<&Page> = self.pages.values().collect();
        pages.sort_by_key(|p| p.page_number);
        pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Load a store from a docstore snapshot written by [`persist`].
    ///
    /// [`persist`]: PageStore::persist
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| ChunkingError::Storage(format!("{}: {e}", path.display())))?;
        let snapshot: StoreSnapshot = serde_json::from_str(&content)?;

        let mut store = Self::new();
        for page in snapshot.pages {
            store.put_page(page);
        }
        store.put_chunks(snapshot.chunks)?;

        info!(
            pages = store.page_count(),
            chunks = store.chunk_count(),
            "loaded document store"
        );
        Ok(store)
    }

    /// Persist the store as a single JSON snapshot, written atomically
    /// via a temp file rename.
    pub async fn persist(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let mut chunks: Vec<&Chunk> = self.chunks.values().collect();
        chunks.sort_by_key(|c| (c.page_number, c.chunk_index));
        let snapshot = StoreSnapshotRef {
            pages: self.pages(),
            chunks,
        };
        let content = serde_json::to_string_pretty(&snapshot)?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ChunkingError::Storage(format!("{}: {e}", parent.display())))?;
            }
        }

        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, &content)
            .await
            .map_err(|e| ChunkingError::Storage(format!("{}: {e}", temp_path.display())))?;
        fs::rename(&temp_path, path)
            .await
            .map_err(|e| ChunkingError::Storage(format!("{}: {e}", path.display())))?;

        debug!(path = %path.display(), "persisted document store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunker::{ChunkerConfig, HierarchicalChunker};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn page(number: u32, kind: PageKind, text: &str) -> Page {
        Page::new(
            number,
            format!("Page {number}"),
            "2024-01-15",
            vec!["Sarah Mitchell".to_string()],
            kind,
            text,
        )
    }

    #[test]
    fn rejects_orphan_chunks() {
        let mut store = PageStore::new();
        let known = page(1, PageKind::Overview, "Known page text.");
        let unknown = page(9, PageKind::Details, "Never stored.");
        store.put_page(known.clone());

        let batch = vec![
            Chunk::new(&known, 0, "Known page text."),
            Chunk::new(&unknown, 0, "Never stored."),
        ];
        let err = store.put_chunks(batch).unwrap_err();
        assert!(matches!(err, ChunkingError::OrphanChunk { .. }));

        // All-or-nothing: the valid chunk was not written either.
        assert_eq!(store.chunk_count(), 0);
    }

    #[test]
    fn chunks_come_back_in_index_order() {
        let mut store = PageStore::new();
        let p = page(2, PageKind::Details, "text");
        store.put_page(p.clone());

        // Insert out of order on purpose.
        store
            .put_chunks(vec![
                Chunk::new(&p, 2, "third"),
                Chunk::new(&p, 0, "first"),
                Chunk::new(&p, 1, "second"),
            ])
            .unwrap();

        let texts: Vec<&str> = store
            .chunks_by_parent("page_2")
            .iter()
            .map(|c| c.text.as_str())
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn reindexing_a_page_is_idempotent() {
        let mut store = PageStore::new();
        let p = page(3, PageKind::Details, "Some body text for chunking.");
        let chunker = HierarchicalChunker::new(ChunkerConfig {
            chunk_size: 300,
            overlap: 40,
        })
        .unwrap();

        for _ in 0..2 {
            let chunks = chunker.chunk(&p);
            store.put_page(p.clone());
            store.put_chunks(chunks).unwrap();
        }

        let children = store.chunks_by_parent("page_3");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].id, "page_3_chunk_0");
        assert_eq!(children[0].text, "Some body text for chunking.");
        assert_eq!(store.chunk_count(), 1);
    }

    #[test]
    fn replacing_a_page_drops_stale_chunks() {
        let mut store = PageStore::new();
        let before = page(4, PageKind::Details, "Old content.");
        store.put_page(before.clone());
        store
            .put_chunks(vec![
                Chunk::new(&before, 0, "Old content."),
                Chunk::new(&before, 1, "Old tail."),
            ])
            .unwrap();

        let after = page(4, PageKind::Details, "New content.");
        store.put_page(after.clone());
        assert_eq!(store.chunk_count(), 0);

        store
            .put_chunks(vec![Chunk::new(&after, 0, "New content.")])
            .unwrap();
        let children = store.chunks_by_parent("page_4");
        assert_eq!(children.len(), 1);
        assert_eq!(children[0].text, "New content.");
    }

    #[test]
    fn overview_pages_in_page_order() {
        let mut store = PageStore::new();
        store.put_page(page(10, PageKind::Overview, "Resolution."));
        store.put_page(page(2, PageKind::Details, "Event."));
        store.put_page(page(1, PageKind::Overview, "Introduction."));

        let ids: Vec<&str> = store
            .overview_pages()
            .iter()
            .map(|p| p.id.as_str())
            .collect();
        assert_eq!(ids, vec!["page_1", "page_10"]);
    }

    #[tokio::test]
    async fn persistence_round_trip() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("docstore.json");

        let mut store = PageStore::new();
        let p = page(1, PageKind::Overview, "Intro text.");
        store.put_page(p.clone());
        store
            .put_chunks(vec![Chunk::new(&p, 0, "Intro text.")])
            .unwrap();
        store.persist(&path).await.unwrap();

        let reloaded = PageStore::load(&path).await.unwrap();
        assert_eq!(reloaded.page_count(), 1);
        assert_eq!(reloaded.chunk_count(), 1);
        assert_eq!(
            reloaded.require_page("page_1").unwrap().text,
            "Intro text."
        );
    }

    #[test]
    fn require_page_reports_missing_id() {
        let store = PageStore::new();
        let err = store.require_page("page_404").unwrap_err();
        assert!(matches!(err, ChunkingError::PageNotFound(_)));
    }
}
