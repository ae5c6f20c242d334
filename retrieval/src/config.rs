//! Engine configuration.
//!
//! One explicit configuration object, constructed once and passed into
//! the engine builder; there is no ambient global. Defaults follow the
//! claim document's characteristics: ~1200-char pages chunked into
//! 300-char segments with a 40-char overlap.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RetrievalError};

/// Tunables for indexing and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Maximum chunk size in characters.
    pub chunk_size: usize,

    /// Overlap carried between consecutive chunks of a paragraph, in
    /// characters. Must be smaller than `chunk_size`.
    pub overlap: usize,

    /// Chunks from the same parent needed to trigger an auto-merge.
    /// Must be greater than 1.
    pub merge_threshold: usize,

    /// Chunk candidates fetched for a needle query.
    pub needle_top_k: usize,

    /// Total pages surfaced for a summary query. Must cover every
    /// Overview page; that bound is checked when summaries are indexed
    /// and the Overview count is known.
    pub summary_top_k: usize,

    /// Concurrent (embed, upsert) units during indexing.
    pub embed_concurrency: usize,

    /// Retries for transient embedding failures during indexing.
    pub max_embed_retries: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            overlap: 40,
            merge_threshold: 3,
            needle_top_k: 6,
            summary_top_k: 6,
            embed_concurrency: 4,
            max_embed_retries: 3,
        }
    }
}

impl EngineConfig {
    /// Validate the construction-time bounds.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(RetrievalError::InvalidConfig(
                "chunk_size must be positive".to_string(),
            ));
        }
        if self.overlap >= self.chunk_size {
            return Err(RetrievalError::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                self.overlap, self.chunk_size
            )));
        }
        if self.merge_threshold <= 1 {
            return Err(RetrievalError::InvalidThreshold(self.merge_threshold));
        }
        if self.needle_top_k == 0 {
            return Err(RetrievalError::InvalidConfig(
                "needle_top_k must be at least 1".to_string(),
            ));
        }
        if self.summary_top_k == 0 {
            return Err(RetrievalError::InvalidConfig(
                "summary_top_k must be at least 1".to_string(),
            ));
        }
        if self.embed_concurrency == 0 {
            return Err(RetrievalError::InvalidConfig(
                "embed_concurrency must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn rejects_overlap_at_chunk_size() {
        let config = EngineConfig {
            chunk_size: 100,
            overlap: 100,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RetrievalError::InvalidConfig(_))
        ));
    }

    #[test]
    fn rejects_degenerate_merge_threshold() {
        let config = EngineConfig {
            merge_threshold: 1,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(RetrievalError::InvalidThreshold(1))
        ));
    }

    #[test]
    fn rejects_zero_top_k() {
        let config = EngineConfig {
            needle_top_k: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_json_with_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "chunk_size": 200, "overlap": 30 }"#).unwrap();
        assert_eq!(config.chunk_size, 200);
        assert_eq!(config.overlap, 30);
        assert_eq!(config.merge_threshold, 3);

        assert!(serde_json::from_str::<EngineConfig>(r#"{ "chunkSize": 200 }"#).is_err());
    }
}
