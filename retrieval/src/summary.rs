//! Summary-route page selection.
//!
//! Overview pages synthesize the whole claim, so they are surfaced
//! unconditionally; Details pages compete for the remaining slots on
//! similarity rank. Overview coverage is never sacrificed: if the
//! Overview pages alone meet the budget, no Details page is added.

use std::collections::{HashMap, HashSet};

use tracing::{debug, warn};

use claim_chunking::{PageKind, PageStore};
use claim_embeddings::RetrievalCandidate;

use crate::error::{Result, RetrievalError};
use crate::evidence::{EvidenceItem, EvidenceSet};

/// Score attached to an Overview page that the summary index did not
/// rank: its inclusion is a policy decision, not a similarity call.
const UNRANKED_OVERVIEW_SCORE: f32 = 1.0;

/// Chooses which page-level entries to surface for a summary query.
#[derive(Debug, Clone)]
pub struct SummarySelector {
    top_k: usize,
}

impl SummarySelector {
    /// Create a selector surfacing at most `top_k` pages in total.
    pub fn new(top_k: usize) -> Result<Self> {
        if top_k == 0 {
            return Err(RetrievalError::InvalidConfig(
                "summary_top_k must be at least 1".to_string(),
            ));
        }
        Ok(Self { top_k })
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Select pages for a summary answer: every Overview page first (in
    /// page order), then the highest-ranked Details pages until `top_k`
    /// is reached, ties truncated by original rank order.
    ///
    /// Candidates referencing pages the store no longer knows are
    /// skipped; an empty candidate set still yields the Overview pages.
    pub fn select(&self, ranked: &[RetrievalCandidate], store: &PageStore) -> EvidenceSet {
        let scores: HashMap<&str, f32> = ranked
            .iter()
            .map(|c| (c.id.as_str(), c.score))
            .collect();

        let mut seen: HashSet<&str> = HashSet::new();
        let mut items: Vec<EvidenceItem> = Vec::new();

        for page in store.overview_pages() {
            let score = scores
                .get(page.id.as_str())
                .copied()
                .unwrap_or(UNRANKED_OVERVIEW_SCORE);
            seen.insert(page.id.as_str());
            items.push(EvidenceItem::from_page(page.clone(), score));
        }

        if items.len() >= self.top_k {
            debug!(
                overview = items.len(),
                top_k = self.top_k,
                "overview pages fill the summary budget"
            );
            return EvidenceSet::new(items);
        }

        let mut remaining = self.top_k - items.len();
        for candidate in ranked {
            if remaining == 0 {
                break;
            }
            let Some(page) = store.get_page(&candidate.id) else {
                warn!(id = %candidate.id, "ranked page not in document store; skipping");
                continue;
            };
            if page.kind != PageKind::Details || !seen.insert(page.id.as_str()) {
                continue;
            }
            items.push(EvidenceItem::from_page(page.clone(), candidate.score));
            remaining -= 1;
        }

        debug!(selected = items.len(), "assembled summary evidence");
        EvidenceSet::new(items)
    }
}
