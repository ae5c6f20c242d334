//! Hierarchical text chunking with boundary-corrected overlap.
//!
//! Pages are split paragraph-first (double newline), preserving natural
//! semantic units. A paragraph that exceeds the chunk size falls back to
//! sentence-level accumulation, and consecutive chunks of the same
//! paragraph share a trailing overlap that is corrected to a clean word
//! and sentence boundary before reuse. Mid-word truncation never
//! happens; a paragraph with no sentence boundary at all is kept as one
//! oversized chunk.

use tracing::debug;

use crate::chunk::Chunk;
use crate::error::{ChunkingError, Result};
use crate::page::Page;

/// Configuration for the hierarchical chunker. Sizes are measured in
/// characters, not bytes.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Maximum chunk size.
    pub chunk_size: usize,

    /// Trailing overlap carried from a closed chunk into the next one.
    /// Must be smaller than `chunk_size`.
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 300,
            overlap: 40,
        }
    }
}

/// Splits a page into overlapping child chunks linked to the parent.
#[derive(Debug, Clone)]
pub struct HierarchicalChunker {
    config: ChunkerConfig,
}

impl HierarchicalChunker {
    /// Create a chunker, rejecting configurations where the overlap
    /// would not fit inside a chunk.
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        if config.chunk_size == 0 {
            return Err(ChunkingError::InvalidConfig(
                "chunk_size must be positive".to_string(),
            ));
        }
        if config.overlap >= config.chunk_size {
            return Err(ChunkingError::InvalidConfig(format!(
                "overlap ({}) must be smaller than chunk_size ({})",
                config.overlap, config.chunk_size
            )));
        }
        Ok(Self { config })
    }

    /// Create a chunker with the default configuration.
    pub fn with_defaults() -> Self {
        Self {
            config: ChunkerConfig::default(),
        }
    }

    /// Split a page into chunks. `chunk_index` runs across the whole
    /// page in emission order, not per paragraph.
    pub fn chunk(&self, page: &Page) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for paragraph in page.text.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }

            if char_len(paragraph) <= self.config.chunk_size {
                self.emit(page, &mut chunks, paragraph);
            } else {
                self.chunk_paragraph(page, paragraph, &mut chunks);
            }
        }

        debug!(page = %page.id, chunks = chunks.len(), "chunked page");
        chunks
    }

    /// Sentence-level fallback for a paragraph larger than the chunk
    /// size: greedily accumulate sentences, closing the buffer whenever
    /// the next sentence would overflow it.
    fn chunk_paragraph(&self, page: &Page, paragraph: &str, chunks: &mut Vec<Chunk>) {
        let mut buffer = String::new();

        for sentence in split_sentences(paragraph) {
            let sentence = sentence.trim();
            if sentence.is_empty() {
                continue;
            }

            if !buffer.is_empty()
                && char_len(&buffer) + char_len(sentence) + 1 > self.config.chunk_size
            {
                let closed = buffer.trim().to_string();
                self.emit(page, chunks, &closed);
                buffer = self.seed_next_buffer(&closed, sentence);
            } else if buffer.is_empty() {
                buffer.push_str(sentence);
            } else {
                buffer.push(' ');
                buffer.push_str(sentence);
            }
        }

        let tail = buffer.trim();
        if !tail.is_empty() {
            self.emit(page, chunks, tail);
        }
    }

    /// Seed the next buffer with the trailing overlap of the chunk just
    /// closed, corrected to a clean boundary: any partial leading word
    /// is dropped, and if a sentence boundary sits inside the seed only
    /// the tail that starts a fresh sentence is kept.
    fn seed_next_buffer(&self, closed: &str, next_sentence: &str) -> String {
        if self.config.overlap == 0 || char_len(closed) <= self.config.overlap {
            return next_sentence.to_string();
        }

        let mut seed = tail_chars(closed, self.config.overlap);
        if let Some(space) = seed.find(' ') {
            seed = &seed[space + 1..];
        }
        if let Some(boundary) = seed.rfind(". ") {
            seed = &seed[boundary + 2..];
        }

        if seed.is_empty() {
            next_sentence.to_string()
        } else {
            format!("{seed} {next_sentence}")
        }
    }

    fn emit(&self, page: &Page, chunks: &mut Vec<Chunk>, text: &str) {
        chunks.push(Chunk::new(page, chunks.len(), text));
    }
}

/// Split a paragraph into sentence units on `". "`, keeping the period
/// with its sentence. Abbreviations, question/exclamation marks, and
/// quoted sentences are a known limitation of this rule and are not
/// handled.
fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;

    for (idx, _) in paragraph.match_indices(". ") {
        sentences.push(&paragraph[start..=idx]);
        start = idx + 2;
    }
    if start < paragraph.len() {
        sentences.push(&paragraph[start..]);
    }

    sentences
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Last `n` characters of `text` as a subslice, char-boundary safe.
fn tail_chars(text: &str, n: usize) -> &str {
    match text.char_indices().rev().nth(n.saturating_sub(1)) {
        Some((idx, _)) => &text[idx..],
        None => text,
    }
}
