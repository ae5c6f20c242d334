//! Query routing: classify a question into a retrieval strategy.
//!
//! `needle` is for fact-lookup queries expecting a specific, localized
//! answer; `summary` is for broad queries expecting synthesis across
//! the whole document. The router is polymorphic over its
//! classification strategy (the default is rule-based, but an
//! implementation may delegate to an external language model), and
//! ambiguity is resolved internally: callers always get a decision.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// The retrieval strategy chosen for a query. Produced per query, not
/// persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteDecision {
    /// Fact lookup over fine-grained chunks.
    Needle,
    /// Broad synthesis over page-level summaries.
    Summary,
}

/// Binary classifier over query intent.
///
/// Implementations must be deterministic for a given query text and
/// strategy state: no mid-decision mutation.
pub trait QueryRouter: Send + Sync {
    /// Name of this strategy, for logs.
    fn name(&self) -> &str;

    /// Classify a query. Never fails; when the strategy cannot commit
    /// with confidence it falls back to its default decision.
    fn route(&self, query: &str) -> RouteDecision;
}

/// Phrases signalling a broad-synthesis question.
const SUMMARY_CUES: &[&str] = &[
    "summarize",
    "summarise",
    "summary",
    "overview",
    "overall",
    "describe",
    "what happened",
    "events that led",
    "tell me about",
    "walk me through",
    "in general",
    "big picture",
];

/// Leading interrogatives typical of a localized fact lookup.
const NEEDLE_OPENERS: &[&str] = &[
    "what", "when", "where", "who", "whose", "which", "how many", "how much", "how long",
];

/// Phrases signalling that a precise value is wanted.
const NEEDLE_CUES: &[&str] = &["exact", "exactly", "specific", "precisely", "what time"];

/// Rule-based router matching broad-synthesis cues against fact-lookup
/// cues. Ties, including queries with no cues at all, fall to the
/// default route, `Needle` unless overridden: the stricter, more
/// falsifiable path is the safer guess.
#[derive(Debug, Clone)]
pub struct KeywordRouter {
    default_route: RouteDecision,
}

impl KeywordRouter {
    pub fn new() -> Self {
        Self {
            default_route: RouteDecision::Needle,
        }
    }

    /// Override the decision taken for ambiguous queries.
    pub fn with_default(mut self, default_route: RouteDecision) -> Self {
        self.default_route = default_route;
        self
    }

    fn summary_signals(text: &str) -> usize {
        SUMMARY_CUES.iter().filter(|cue| text.contains(*cue)).count()
    }

    fn needle_signals(text: &str) -> usize {
        let opener = NEEDLE_OPENERS
            .iter()
            .any(|opener| text.starts_with(opener));
        let cues = NEEDLE_CUES.iter().filter(|cue| text.contains(*cue)).count();
        usize::from(opener) + cues
    }
}

impl Default for KeywordRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryRouter for KeywordRouter {
    fn name(&self) -> &str {
        "keyword"
    }

    fn route(&self, query: &str) -> RouteDecision {
        let text = query.to_lowercase();
        let summary = Self::summary_signals(&text);
        let needle = Self::needle_signals(&text);

        let decision = match summary.cmp(&needle) {
            std::cmp::Ordering::Greater => RouteDecision::Summary,
            std::cmp::Ordering::Less => RouteDecision::Needle,
            std::cmp::Ordering::Equal => self.default_route,
        };

        debug!(?decision, summary, needle, "routed query");
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn broad_queries_route_to_summary() {
        let router = KeywordRouter::new();
        assert_eq!(
            router.route("Summarize the events that led to the claim."),
            RouteDecision::Summary
        );
        assert_eq!(
            router.route("Give me an overview of the medical treatment."),
            RouteDecision::Summary
        );
        assert_eq!(
            router.route("Describe the damage across all vehicles."),
            RouteDecision::Summary
        );
    }

    #[test]
    fn fact_queries_route_to_needle() {
        let router = KeywordRouter::new();
        assert_eq!(
            router.route("What was the license plate of the Toyota Camry?"),
            RouteDecision::Needle
        );
        assert_eq!(
            router.route("What time did the collision occur?"),
            RouteDecision::Needle
        );
        assert_eq!(
            router.route("How many feet were the skid marks?"),
            RouteDecision::Needle
        );
        assert_eq!(
            router.route("Who was determined to be at fault?"),
            RouteDecision::Needle
        );
    }

    #[test]
    fn ambiguous_queries_take_the_default() {
        let router = KeywordRouter::new();
        assert_eq!(router.route("the insurance claim"), RouteDecision::Needle);

        let router = KeywordRouter::new().with_default(RouteDecision::Summary);
        assert_eq!(router.route("the insurance claim"), RouteDecision::Summary);
    }

    #[test]
    fn decision_is_deterministic() {
        let router = KeywordRouter::new();
        let query = "What was Sarah Mitchell's blood pressure during assessment?";
        let first = router.route(query);
        for _ in 0..10 {
            assert_eq!(router.route(query), first);
        }
    }
}
