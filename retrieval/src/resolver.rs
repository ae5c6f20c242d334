//! Auto-merging of chunk-level candidates into parent pages.
//!
//! When enough independently retrieved chunks point at the same parent
//! page, the fine-grained hits are an unreliable substitute for full
//! context: the resolver trades potentially fragmented duplication for
//! the single coherent page. Groups below the threshold pass through
//! untouched, keeping needle-level precision.

use std::collections::HashMap;

use tracing::{debug, warn};

use claim_chunking::PageStore;
use claim_embeddings::RetrievalCandidate;

use crate::error::{Result, RetrievalError};
use crate::evidence::{EvidenceItem, EvidenceSet};

/// Collapses chunk clusters that share a parent into the parent page.
#[derive(Debug, Clone)]
pub struct AutoMergeResolver {
    threshold: usize,
}

impl AutoMergeResolver {
    /// Create a resolver. A threshold of 1 or less would merge on any
    /// single hit and is rejected as a configuration error.
    pub fn new(threshold: usize) -> Result<Self> {
        if threshold <= 1 {
            return Err(RetrievalError::InvalidThreshold(threshold));
        }
        Ok(Self { threshold })
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Post-process chunk-level candidates into an evidence set.
    ///
    /// Candidates are grouped by parent page. A group with at least
    /// `threshold` members is replaced by one page-level item scored
    /// with the group's best score; smaller groups pass through as
    /// individual chunk items. The result is ordered by descending
    /// score. An empty candidate set yields an empty evidence set.
    ///
    /// Candidates whose chunk is no longer in the store are skipped: a
    /// concurrent re-index may leave the vector index briefly ahead of
    /// the document store.
    pub fn resolve(&self, candidates: &[RetrievalCandidate], store: &PageStore) -> EvidenceSet {
        if candidates.is_empty() {
            return EvidenceSet::empty();
        }

        let mut parent_order: Vec<&str> = Vec::new();
        let mut groups: HashMap<&str, Vec<(f32, &str)>> = HashMap::new();

        for candidate in candidates {
            let Some(chunk) = store.get_chunk(&candidate.id) else {
                warn!(id = %candidate.id, "candidate chunk not in document store; skipping");
                continue;
            };
            let parent = chunk.parent_id.as_str();
            if !groups.contains_key(parent) {
                parent_order.push(parent);
            }
            groups
                .entry(parent)
                .or_default()
                .push((candidate.score, chunk.id.as_str()));
        }

        let mut items: Vec<EvidenceItem> = Vec::new();
        for parent in parent_order {
            let Some(members) = groups.get(parent) else {
                continue;
            };

            if members.len() >= self.threshold {
                let Some(page) = store.get_page(parent) else {
                    warn!(page = parent, "merge target page missing from store; skipping group");
                    continue;
                };
                let best = members
                    .iter()
                    .map(|(score, _)| *score)
                    .fold(f32::MIN, f32::max);
                debug!(
                    page = parent,
                    chunks = members.len(),
                    score = best,
                    "merged chunk cluster into parent page"
                );
                items.push(EvidenceItem::from_page(page.clone(), best));
            } else {
                for (score, chunk_id) in members {
                    if let Some(chunk) = store.get_chunk(chunk_id) {
                        items.push(EvidenceItem::from_chunk(chunk.clone(), *score));
                    }
                }
            }
        }

        // Stable sort: equal scores keep the order established above.
        items.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        EvidenceSet::new(items)
    }
}
