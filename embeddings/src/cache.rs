//! Embedding cache to avoid redundant provider calls.
//!
//! Re-indexing the same claim is idempotent end to end, so repeated
//! runs would otherwise re-pay every embedding call. The cache keys on
//! a hash of (text, model) and evicts the oldest entry at capacity.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::Embedding;
use crate::error::Result;
use crate::provider::EmbeddingProvider;

struct CacheEntry {
    embedding: Embedding,
    inserted_at: u64,
}

/// In-memory embedding cache with capacity-based eviction.
pub struct EmbeddingCache {
    inner: RwLock<CacheInner>,
    max_entries: usize,
}

struct CacheInner {
    entries: HashMap<String, CacheEntry>,
    clock: u64,
}

impl EmbeddingCache {
    /// Create a cache holding at most `max_entries` embeddings.
    pub fn new(max_entries: usize) -> Self {
        Self {
            inner: RwLock::new(CacheInner {
                entries: HashMap::new(),
                clock: 0,
            }),
            max_entries,
        }
    }

    fn hash_key(text: &str, model: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        model.hash(&mut hasher);
        format!("{:x}", hasher.finish())
    }

    /// Get a cached embedding.
    pub async fn get(&self, text: &str, model: &str) -> Option<Embedding> {
        let key = Self::hash_key(text, model);
        let inner = self.inner.read().await;
        inner.entries.get(&key).map(|e| e.embedding.clone())
    }

    /// Cache an embedding, evicting the oldest entry at capacity.
    pub async fn put(&self, text: &str, model: &str, embedding: Embedding) {
        let key = Self::hash_key(text, model);
        let mut inner = self.inner.write().await;

        if inner.entries.len() >= self.max_entries && !inner.entries.contains_key(&key) {
            if let Some(oldest_key) = inner
                .entries
                .iter()
                .min_by_key(|(_, e)| e.inserted_at)
                .map(|(k, _)| k.clone())
            {
                inner.entries.remove(&oldest_key);
            }
        }

        inner.clock += 1;
        let inserted_at = inner.clock;
        inner.entries.insert(
            key,
            CacheEntry {
                embedding,
                inserted_at,
            },
        );
        debug!(model, "cached embedding");
    }

    /// Number of cached entries.
    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    /// Whether the cache is empty.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Drop every cached entry.
    pub async fn clear(&self) {
        self.inner.write().await.entries.clear();
        info!("cleared embedding cache");
    }
}

/// An [`EmbeddingProvider`] wrapper that consults the cache before
/// calling the inner provider, so it can slot in anywhere a provider
/// is expected.
pub struct CachedProvider<P> {
    inner: P,
    cache: EmbeddingCache,
}

impl<P: EmbeddingProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: EmbeddingCache) -> Self {
        Self { inner, cache }
    }

    /// The underlying cache.
    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }
}

#[async_trait]
impl<P: EmbeddingProvider> EmbeddingProvider for CachedProvider<P> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn model(&self) -> &str {
        self.inner.model()
    }

    fn dimension(&self) -> usize {
        self.inner.dimension()
    }

    async fn embed(&self, text: &str) -> Result<Embedding> {
        if let Some(embedding) = self.cache.get(text, self.inner.model()).await {
            debug!("embedding cache hit");
            return Ok(embedding);
        }

        let embedding = self.inner.embed(text).await?;
        self.cache
            .put(text, self.inner.model(), embedding.clone())
            .await;
        Ok(embedding)
    }

    fn is_available(&self) -> bool {
        self.inner.is_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn put_then_get() {
        let cache = EmbeddingCache::new(100);
        cache.put("hello", "model-1", vec![1.0, 2.0]).await;

        assert_eq!(cache.get("hello", "model-1").await, Some(vec![1.0, 2.0]));
        assert_eq!(cache.get("hello", "model-2").await, None);
        assert_eq!(cache.get("other", "model-1").await, None);
    }

    #[tokio::test]
    async fn evicts_oldest_at_capacity() {
        let cache = EmbeddingCache::new(2);
        cache.put("a", "m", vec![1.0]).await;
        cache.put("b", "m", vec![2.0]).await;
        cache.put("c", "m", vec![3.0]).await;

        assert_eq!(cache.len().await, 2);
        assert_eq!(cache.get("a", "m").await, None);
        assert_eq!(cache.get("c", "m").await, Some(vec![3.0]));
    }

    /// Provider double that counts how often it is actually called.
    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn name(&self) -> &str {
            "counting"
        }

        fn model(&self) -> &str {
            "counting-model"
        }

        fn dimension(&self) -> usize {
            2
        }

        async fn embed(&self, _text: &str) -> Result<Embedding> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.5, 0.5])
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn cached_provider_skips_repeat_calls() {
        let provider = CachedProvider::new(
            CountingProvider {
                calls: AtomicUsize::new(0),
            },
            EmbeddingCache::new(16),
        );

        provider.embed("the skid marks").await.unwrap();
        provider.embed("the skid marks").await.unwrap();
        provider.embed("the skid marks").await.unwrap();

        assert_eq!(provider.inner.calls.load(Ordering::SeqCst), 1);
        assert_eq!(provider.cache().len().await, 1);
    }
}
