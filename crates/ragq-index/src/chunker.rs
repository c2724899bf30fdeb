//! Fixed-size overlapping word windows with provenance.

use serde::{Deserialize, Serialize};

use crate::error::{IndexError, Result};

/// Characters per word used to turn character-oriented sizes into word counts.
pub const CHARS_PER_WORD: usize = 4;

/// One retrievable unit of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub doc_id: u64,
    /// `"{doc_id}_{offset}"` where `offset` is the first word's position in the document.
    pub chunk_id: String,
}

/// Chunker configuration.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Target chunk size in characters (default: 400).
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters (default: 50).
    pub chunk_overlap: usize,
    /// Windows with fewer words are dropped (default: 10).
    pub min_words: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            chunk_size: 400,
            chunk_overlap: 50,
            min_words: 10,
        }
    }
}

impl ChunkerConfig {
    #[must_use]
    pub fn window_words(&self) -> usize {
        self.chunk_size / CHARS_PER_WORD
    }

    #[must_use]
    pub fn overlap_words(&self) -> usize {
        self.chunk_overlap / CHARS_PER_WORD
    }
}

#[derive(Debug, Clone)]
pub struct Chunker {
    window: usize,
    overlap: usize,
    stride: usize,
    min_words: usize,
}

impl Chunker {
    /// # Errors
    ///
    /// Returns [`IndexError::InvalidChunking`] when the overlap is not smaller
    /// than the window, since the window would never advance.
    pub fn new(config: &ChunkerConfig) -> Result<Self> {
        let window = config.window_words();
        let overlap = config.overlap_words();
        if window <= overlap {
            return Err(IndexError::InvalidChunking { window, overlap });
        }
        Ok(Self {
            window,
            overlap,
            stride: window - overlap,
            min_words: config.min_words,
        })
    }

    #[must_use]
    pub fn window(&self) -> usize {
        self.window
    }

    #[must_use]
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    #[must_use]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Split `text` on whitespace and slide a window over the words.
    ///
    /// Windows shorter than the minimum word count are discarded, so short
    /// documents yield no chunks.
    #[must_use]
    pub fn chunk(&self, text: &str, doc_id: u64) -> Vec<Chunk> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let mut chunks = Vec::new();

        for offset in (0..words.len()).step_by(self.stride) {
            let end = (offset + self.window).min(words.len());
            let window = &words[offset..end];
            if window.len() < self.min_words {
                continue;
            }
            chunks.push(Chunk {
                text: window.join(" "),
                doc_id,
                chunk_id: format!("{doc_id}_{offset}"),
            });
        }

        chunks
    }
}
