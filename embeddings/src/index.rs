//! The vector index capability and its reference implementations.
//!
//! The retrieval core depends only on the [`VectorIndex`] trait; the
//! backing store is a deployment concern. Upserts are idempotent by id
//! so retries and partial re-runs never duplicate data, and queries
//! rank by descending similarity with ties broken by insertion order.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::Embedding;
use crate::error::{EmbeddingError, Result};
use crate::similarity::cosine_similarity;

/// A scored hit returned by a vector index query. Transient: produced
/// per query and never persisted. The `metadata` payload is owned by
/// the index; the retrieval core resolves records through its document
/// store rather than through this value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalCandidate {
    /// Chunk or page id, depending on which index produced the hit.
    pub id: String,

    /// Similarity score, higher is better.
    pub score: f32,

    /// Pass-through payload attached at upsert time.
    pub metadata: Option<serde_json::Value>,
}

/// Nearest-neighbor lookup over embeddings.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Name of this index, for logs.
    fn name(&self) -> &str;

    /// Insert or replace the vector stored under `id`. Idempotent:
    /// upserting the same id twice leaves one entry.
    async fn upsert(
        &self,
        id: &str,
        embedding: Embedding,
        metadata: Option<serde_json::Value>,
    ) -> Result<()>;

    /// The `k` nearest entries by descending similarity, `k >= 1`.
    /// Equal scores keep insertion order.
    async fn query(&self, embedding: &Embedding, k: usize) -> Result<Vec<RetrievalCandidate>>;

    /// Number of stored entries.
    async fn len(&self) -> usize;
}

struct IndexEntry {
    id: String,
    embedding: Embedding,
    metadata: Option<serde_json::Value>,
}

struct IndexInner {
    entries: Vec<IndexEntry>,
    slots: HashMap<String, usize>,
}

/// Insertion-ordered in-memory index.
///
/// Re-upserting an id replaces the entry in place, preserving both
/// idempotency and the insertion-order tie break.
pub struct InMemoryIndex {
    name: String,
    dimension: usize,
    inner: RwLock<IndexInner>,
}

impl InMemoryIndex {
    /// Create an empty index expecting embeddings of `dimension`.
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            inner: RwLock::new(IndexInner {
                entries: Vec::new(),
                slots: HashMap::new(),
            }),
        }
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<()> {
        if embedding.len() != self.dimension {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert(
        &self,
        id: &str,
        embedding: Embedding,
        metadata: Option<serde_json::Value>,
    ) -> Result<()> {
        self.check_dimension(&embedding)?;

        let mut inner = self.inner.write().await;
        match inner.slots.get(id).copied() {
            Some(slot) => {
                inner.entries[slot].embedding = embedding;
                inner.entries[slot].metadata = metadata;
            }
            None => {
                let slot = inner.entries.len();
                inner.slots.insert(id.to_string(), slot);
                inner.entries.push(IndexEntry {
                    id: id.to_string(),
                    embedding,
                    metadata,
                });
            }
        }

        debug!(index = %self.name, id, "upserted embedding");
        Ok(())
    }

    async fn query(&self, embedding: &Embedding, k: usize) -> Result<Vec<RetrievalCandidate>> {
        if k == 0 {
            return Err(EmbeddingError::InvalidTopK { k });
        }
        self.check_dimension(embedding)?;

        let inner = self.inner.read().await;
        let mut scored: Vec<(OrderedFloat<f32>, usize)> = Vec::with_capacity(inner.entries.len());
        for (slot, entry) in inner.entries.iter().enumerate() {
            let score = cosine_similarity(embedding, &entry.embedding)?;
            scored.push((OrderedFloat(score), slot));
        }

        // Stable sort: equal scores keep insertion order.
        scored.sort_by(|a, b| b.0.cmp(&a.0));

        Ok(scored
            .into_iter()
            .take(k)
            .map(|(score, slot)| {
                let entry = &inner.entries[slot];
                RetrievalCandidate {
                    id: entry.id.clone(),
                    score: score.0,
                    metadata: entry.metadata.clone(),
                }
            })
            .collect())
    }

    async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }
}

/// Two write routes to one logical index: a best-effort primary and a
/// fallback taken only on failures classified as transient. The
/// transition is logged as an observable event; fatal errors propagate
/// untouched. Reads go to the primary only: query-time failures
/// surface to the caller rather than guessing from a partial view.
pub struct TieredIndex {
    name: String,
    primary: Arc<dyn VectorIndex>,
    fallback: Arc<dyn VectorIndex>,
}

impl TieredIndex {
    pub fn new(primary: Arc<dyn VectorIndex>, fallback: Arc<dyn VectorIndex>) -> Self {
        Self {
            name: format!("tiered:{}/{}", primary.name(), fallback.name()),
            primary,
            fallback,
        }
    }
}

#[async_trait]
impl VectorIndex for TieredIndex {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert(
        &self,
        id: &str,
        embedding: Embedding,
        metadata: Option<serde_json::Value>,
    ) -> Result<()> {
        match self
            .primary
            .upsert(id, embedding.clone(), metadata.clone())
            .await
        {
            Ok(()) => Ok(()),
            Err(err) if err.is_transient() => {
                warn!(
                    primary = self.primary.name(),
                    fallback = self.fallback.name(),
                    %err,
                    "primary index write failed; falling back"
                );
                self.fallback.upsert(id, embedding, metadata).await
            }
            Err(err) => Err(err),
        }
    }

    async fn query(&self, embedding: &Embedding, k: usize) -> Result<Vec<RetrievalCandidate>> {
        self.primary.query(embedding, k).await
    }

    async fn len(&self) -> usize {
        self.primary.len().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn upsert_is_idempotent() {
        let index = InMemoryIndex::new("chunks", 3);
        index
            .upsert("page_1_chunk_0", vec![1.0, 0.0, 0.0], None)
            .await
            .unwrap();
        index
            .upsert("page_1_chunk_0", vec![0.0, 1.0, 0.0], None)
            .await
            .unwrap();

        assert_eq!(index.len().await, 1);

        let hits = index.query(&vec![0.0, 1.0, 0.0], 1).await.unwrap();
        assert_eq!(hits[0].id, "page_1_chunk_0");
        assert!((hits[0].score - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn ranks_by_descending_similarity() {
        let index = InMemoryIndex::new("chunks", 3);
        index.upsert("far", vec![0.0, 1.0, 0.0], None).await.unwrap();
        index.upsert("near", vec![1.0, 0.0, 0.0], None).await.unwrap();
        index
            .upsert("middle", vec![0.7, 0.7, 0.0], None)
            .await
            .unwrap();

        let hits = index.query(&vec![1.0, 0.0, 0.0], 2).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "middle"]);
    }

    #[tokio::test]
    async fn ties_keep_insertion_order() {
        let index = InMemoryIndex::new("chunks", 2);
        index.upsert("first", vec![1.0, 0.0], None).await.unwrap();
        index.upsert("second", vec![1.0, 0.0], None).await.unwrap();
        index.upsert("third", vec![1.0, 0.0], None).await.unwrap();

        // Re-upserting does not move an entry to the back of the line.
        index.upsert("first", vec![1.0, 0.0], None).await.unwrap();

        let hits = index.query(&vec![1.0, 0.0], 3).await.unwrap();
        let ids: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn rejects_zero_top_k() {
        let index = InMemoryIndex::new("chunks", 2);
        let err = index.query(&vec![1.0, 0.0], 0).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidTopK { k: 0 }));
    }

    #[tokio::test]
    async fn rejects_dimension_mismatch() {
        let index = InMemoryIndex::new("chunks", 3);
        let err = index.upsert("bad", vec![1.0, 0.0], None).await.unwrap_err();
        assert!(matches!(err, EmbeddingError::DimensionMismatch { .. }));
    }

    /// Index double that fails every upsert with a configurable error.
    struct FailingIndex {
        transient: bool,
    }

    #[async_trait]
    impl VectorIndex for FailingIndex {
        fn name(&self) -> &str {
            "failing"
        }

        async fn upsert(
            &self,
            _id: &str,
            _embedding: Embedding,
            _metadata: Option<serde_json::Value>,
        ) -> Result<()> {
            if self.transient {
                Err(EmbeddingError::IndexUnavailable(
                    "REST surface not ready".to_string(),
                ))
            } else {
                Err(EmbeddingError::DimensionMismatch {
                    expected: 3,
                    actual: 2,
                })
            }
        }

        async fn query(
            &self,
            _embedding: &Embedding,
            _k: usize,
        ) -> Result<Vec<RetrievalCandidate>> {
            Err(EmbeddingError::IndexUnavailable("down".to_string()))
        }

        async fn len(&self) -> usize {
            0
        }
    }

    #[tokio::test]
    async fn tiered_write_falls_back_on_transient_failure() {
        let fallback = Arc::new(InMemoryIndex::new("direct", 2));
        let tiered = TieredIndex::new(
            Arc::new(FailingIndex { transient: true }),
            Arc::clone(&fallback) as Arc<dyn VectorIndex>,
        );

        tiered
            .upsert("page_1_chunk_0", vec![1.0, 0.0], None)
            .await
            .unwrap();
        assert_eq!(fallback.len().await, 1);
    }

    #[tokio::test]
    async fn tiered_write_propagates_fatal_failure() {
        let fallback = Arc::new(InMemoryIndex::new("direct", 2));
        let tiered = TieredIndex::new(
            Arc::new(FailingIndex { transient: false }),
            Arc::clone(&fallback) as Arc<dyn VectorIndex>,
        );

        let err = tiered
            .upsert("page_1_chunk_0", vec![1.0, 0.0], None)
            .await
            .unwrap_err();
        assert!(matches!(err, EmbeddingError::DimensionMismatch { .. }));
        assert_eq!(fallback.len().await, 0);
    }
}
