//! The retrieval engine: indexing and routed retrieval in one place.
//!
//! Indexing is a batch, write-heavy phase: pages are chunked into the
//! document store under a write lock, then embedded and upserted into
//! the chunk index as independent bounded-concurrency units whose
//! correctness depends only on upsert idempotency. Retrieval is
//! read-only and per-request independent, so concurrent queries run
//! fully in parallel against the shared store and indexes.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use claim_chunking::{ChunkerConfig, HierarchicalChunker, Page, PageStore};
use claim_embeddings::{
    Embedding, EmbeddingError, EmbeddingProvider, InMemoryIndex, VectorIndex,
};

use crate::config::EngineConfig;
use crate::error::{Result, RetrievalError};
use crate::evidence::EvidenceSet;
use crate::resolver::AutoMergeResolver;
use crate::router::{KeywordRouter, QueryRouter, RouteDecision};
use crate::summary::SummarySelector;

/// A page-level summary supplied by the caller. Summary *generation*
/// is an external language-model concern; the engine only embeds and
/// indexes the result.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageSummary {
    /// Id of the summarized page. Must resolve in the store.
    pub page_id: String,

    /// The summary text to embed.
    pub text: String,
}

impl PageSummary {
    pub fn new(page_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            page_id: page_id.into(),
            text: text.into(),
        }
    }
}

/// What an indexing run touched, for observability.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IndexReport {
    pub pages: usize,
    pub chunks: usize,
}

/// The outcome of one retrieval: the evidence set plus the route that
/// produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Retrieval {
    pub route: RouteDecision,
    pub evidence: EvidenceSet,
}

impl Retrieval {
    /// Chunk-level evidence items used.
    pub fn chunks_used(&self) -> usize {
        self.evidence.chunk_count()
    }

    /// Page-level evidence items used (merged parents on the needle
    /// route, selected pages on the summary route).
    pub fn pages_used(&self) -> usize {
        self.evidence.page_count()
    }
}

/// Composes the chunker, document store, vector indexes, router and
/// post-processing policies into one `retrieve(query)` surface.
pub struct RetrievalEngine {
    config: EngineConfig,
    store: Arc<RwLock<PageStore>>,
    chunk_index: Arc<dyn VectorIndex>,
    summary_index: Arc<dyn VectorIndex>,
    provider: Arc<dyn EmbeddingProvider>,
    router: Arc<dyn QueryRouter>,
    resolver: AutoMergeResolver,
    selector: SummarySelector,
    chunker: HierarchicalChunker,
}

impl RetrievalEngine {
    /// Start building an engine.
    pub fn builder() -> RetrievalEngineBuilder {
        RetrievalEngineBuilder::new()
    }

    /// Shared handle to the document store, e.g. for persistence.
    pub fn store(&self) -> Arc<RwLock<PageStore>> {
        Arc::clone(&self.store)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Index a batch of pages: chunk each page into the document store,
    /// then embed and upsert every chunk with bounded concurrency.
    /// Upserts are idempotent by id, so a retry or partial re-run never
    /// duplicates data.
    pub async fn index_pages(&self, pages: Vec<Page>) -> Result<IndexReport> {
        let page_count = pages.len();
        let mut all_chunks = Vec::new();
        {
            let mut store = self.store.write().await;
            for page in pages {
                let chunks = self.chunker.chunk(&page);
                debug!(page = %page.id, chunks = chunks.len(), "chunked page");
                store.put_page(page);
                store.put_chunks(chunks.clone())?;
                all_chunks.extend(chunks);
            }
        }

        let outcomes: Vec<Result<()>> = stream::iter(all_chunks.iter().map(|chunk| async move {
            let embedding = self.embed_with_retry(&chunk.text).await?;
            let metadata = serde_json::json!({
                "parent_id": chunk.parent_id,
                "page_number": chunk.page_number,
                "header": chunk.header,
            });
            self.chunk_index
                .upsert(&chunk.id, embedding, Some(metadata))
                .await?;
            Ok(())
        }))
        .buffer_unordered(self.config.embed_concurrency)
        .collect()
        .await;
        for outcome in outcomes {
            outcome?;
        }

        let report = IndexReport {
            pages: page_count,
            chunks: all_chunks.len(),
        };
        info!(
            pages = report.pages,
            chunks = report.chunks,
            "indexed claim pages"
        );
        Ok(report)
    }

    /// Embed caller-supplied page summaries into the summary index.
    /// Every summary must reference a stored page, and the configured
    /// summary budget must cover all Overview pages.
    pub async fn index_summaries(&self, summaries: Vec<PageSummary>) -> Result<usize> {
        {
            let store = self.store.read().await;
            let overview_count = store.overview_pages().len();
            if self.config.summary_top_k < overview_count {
                return Err(RetrievalError::InvalidConfig(format!(
                    "summary_top_k ({}) must cover all {} overview pages",
                    self.config.summary_top_k, overview_count
                )));
            }
            for summary in &summaries {
                if store.get_page(&summary.page_id).is_none() {
                    return Err(RetrievalError::UnknownPage(summary.page_id.clone()));
                }
            }
        }

        let outcomes: Vec<Result<()>> = stream::iter(summaries.iter().map(|summary| async move {
            let embedding = self.embed_with_retry(&summary.text).await?;
            self.summary_index
                .upsert(&summary.page_id, embedding, None)
                .await?;
            Ok(())
        }))
        .buffer_unordered(self.config.embed_concurrency)
        .collect()
        .await;
        for outcome in outcomes {
            outcome?;
        }

        info!(summaries = summaries.len(), "indexed page summaries");
        Ok(summaries.len())
    }

    /// Answer a query: embed it, route it, and assemble evidence.
    ///
    /// Query-time failures are surfaced to the caller as retrievable
    /// errors; the engine never guesses from partial evidence.
    pub async fn retrieve(&self, query: &str) -> Result<Retrieval> {
        let embedding = self.provider.embed(query).await?;
        self.retrieve_with_embedding(query, embedding).await
    }

    /// Answer a query whose embedding the caller already computed.
    pub async fn retrieve_with_embedding(
        &self,
        query: &str,
        embedding: Embedding,
    ) -> Result<Retrieval> {
        let route = self.router.route(query);
        debug!(?route, strategy = self.router.name(), "dispatching query");

        let store = self.store.read().await;
        let evidence = match route {
            RouteDecision::Needle => {
                let candidates = self
                    .chunk_index
                    .query(&embedding, self.config.needle_top_k)
                    .await?;
                self.resolver.resolve(&candidates, &store)
            }
            RouteDecision::Summary => {
                // Overview pages are ranked in the summary index too;
                // widen the fetch so they never crowd out Details
                // candidates competing for the remaining slots.
                let k = self.config.summary_top_k + store.overview_pages().len();
                let candidates = self.summary_index.query(&embedding, k).await?;
                self.selector.select(&candidates, &store)
            }
        };

        info!(
            ?route,
            items = evidence.len(),
            chunks = evidence.chunk_count(),
            pages = evidence.page_count(),
            "assembled evidence set"
        );
        Ok(Retrieval { route, evidence })
    }

    /// Indexing-side embedding with retry: transient failures back off
    /// and try again (honoring a rate limiter's retry-after), fatal
    /// ones propagate immediately.
    async fn embed_with_retry(&self, text: &str) -> Result<Embedding> {
        let mut attempt = 0;
        loop {
            match self.provider.embed(text).await {
                Ok(embedding) => return Ok(embedding),
                Err(err) if err.is_transient() && attempt < self.config.max_embed_retries => {
                    let delay = match &err {
                        EmbeddingError::RateLimited { retry_after_secs } => {
                            Duration::from_secs(*retry_after_secs)
                        }
                        _ => Duration::from_millis(200u64 << attempt),
                    };
                    attempt += 1;
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        %err,
                        "transient embedding failure; backing off"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Builder for [`RetrievalEngine`].
///
/// The embedding provider is the only mandatory piece; the store,
/// indexes and router default to an empty store, in-memory indexes
/// sized to the provider's dimension, and the keyword router.
pub struct RetrievalEngineBuilder {
    config: EngineConfig,
    store: Option<PageStore>,
    chunk_index: Option<Arc<dyn VectorIndex>>,
    summary_index: Option<Arc<dyn VectorIndex>>,
    provider: Option<Arc<dyn EmbeddingProvider>>,
    router: Option<Arc<dyn QueryRouter>>,
}

impl RetrievalEngineBuilder {
    pub fn new() -> Self {
        Self {
            config: EngineConfig::default(),
            store: None,
            chunk_index: None,
            summary_index: None,
            provider: None,
            router: None,
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Start from a pre-populated document store (e.g. one reloaded
    /// from a persisted snapshot).
    pub fn with_store(mut self, store: PageStore) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_chunk_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.chunk_index = Some(index);
        self
    }

    pub fn with_summary_index(mut self, index: Arc<dyn VectorIndex>) -> Self {
        self.summary_index = Some(index);
        self
    }

    pub fn with_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn with_router(mut self, router: Arc<dyn QueryRouter>) -> Self {
        self.router = Some(router);
        self
    }

    /// Validate the configuration and assemble the engine.
    pub fn build(self) -> Result<RetrievalEngine> {
        self.config.validate()?;

        let provider = self.provider.ok_or_else(|| {
            RetrievalError::InvalidConfig("an embedding provider is required".to_string())
        })?;
        let dimension = provider.dimension();

        let chunk_index = self
            .chunk_index
            .unwrap_or_else(|| Arc::new(InMemoryIndex::new("chunks", dimension)));
        let summary_index = self
            .summary_index
            .unwrap_or_else(|| Arc::new(InMemoryIndex::new("summaries", dimension)));
        let router = self
            .router
            .unwrap_or_else(|| Arc::new(KeywordRouter::new()));

        let resolver = AutoMergeResolver::new(self.config.merge_threshold)?;
        let selector = SummarySelector::new(self.config.summary_top_k)?;
        let chunker = HierarchicalChunker::new(ChunkerConfig {
            chunk_size: self.config.chunk_size,
            overlap: self.config.overlap,
        })?;

        info!(
            provider = provider.name(),
            chunk_index = chunk_index.name(),
            summary_index = summary_index.name(),
            router = router.name(),
            "retrieval engine ready"
        );

        Ok(RetrievalEngine {
            config: self.config,
            store: Arc::new(RwLock::new(self.store.unwrap_or_default())),
            chunk_index,
            summary_index,
            provider,
            router,
            resolver,
            selector,
            chunker,
        })
    }
}

impl Default for RetrievalEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
