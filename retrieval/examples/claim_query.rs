//! Minimal end-to-end demo: index a few claim pages with a local
//! hash-based embedding double, then run one query down each route.
//!
//! ```bash
//! cargo run --example claim_query
//! ```

use std::sync::Arc;

use async_trait::async_trait;

use claim_embeddings::{Embedding, EmbeddingProvider, Result as EmbeddingResult};
use claim_retrieval::{
    EngineConfig, Page, PageKind, PageSummary, RetrievalEngine,
};

/// Offline embedding double: a bag-of-words vector over hashed word
/// buckets. Good enough to demo retrieval without an API key.
struct HashedBagProvider;

const DIMENSION: usize = 64;

#[async_trait]
impl EmbeddingProvider for HashedBagProvider {
    fn name(&self) -> &str {
        "hashed-bag"
    }

    fn model(&self) -> &str {
        "hashed-bag"
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }

    async fn embed(&self, text: &str) -> EmbeddingResult<Embedding> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut vector = vec![0.0f32; DIMENSION];
        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if word.len() < 4 {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            word.hash(&mut hasher);
            vector[(hasher.finish() % DIMENSION as u64) as usize] += 1.0;
        }
        Ok(vector)
    }

    fn is_available(&self) -> bool {
        true
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let engine = RetrievalEngine::builder()
        .with_config(EngineConfig {
            needle_top_k: 4,
            summary_top_k: 3,
            ..Default::default()
        })
        .with_provider(Arc::new(HashedBagProvider))
        .build()?;

    let pages = vec![
        Page::new(
            1,
            "Claim Introduction and Overview",
            "2024-01-15",
            vec!["Sarah Mitchell".to_string()],
            PageKind::Overview,
            "This insurance claim covers a multi-vehicle collision at the \
             intersection of Maple Avenue and 5th Street in Seattle.",
        ),
        Page::new(
            2,
            "Event 1: Initial Collision",
            "2024-01-15 09:23:45",
            vec!["Robert Chen".to_string()],
            PageKind::Details,
            "A Toyota Camry bearing license plate WA-ABC-1234 entered the \
             intersection against a red signal at forty-five miles per hour.",
        ),
        Page::new(
            3,
            "Event 2: Emergency Response",
            "2024-01-15 09:31:22",
            vec!["Paramedic Jennifer Ross".to_string()],
            PageKind::Details,
            "Paramedics recorded blood pressure of 145/92 and secured the \
             scene; skid marks measured exactly 47 feet on the wet pavement.",
        ),
    ];
    engine.index_pages(pages).await?;

    engine
        .index_summaries(vec![
            PageSummary::new("page_1", "Overview of the claim and the collision."),
            PageSummary::new("page_2", "How the collision happened at the intersection."),
            PageSummary::new("page_3", "Emergency response and scene evidence."),
        ])
        .await?;

    for query in [
        "What was the license plate of the Toyota Camry?",
        "Summarize the events that led to the claim.",
    ] {
        let result = engine.retrieve(query).await?;
        println!("\nquery: {query}");
        println!("route: {:?}", result.route);
        for item in result.evidence.iter() {
            let level = if item.is_page() { "page " } else { "chunk" };
            println!(
                "  [{level}] {:<40} score {:.3}  {}",
                item.header(),
                item.score,
                item.page_id()
            );
        }
    }

    Ok(())
}
