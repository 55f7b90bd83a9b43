//! Overlapping word-window chunking

use crate::config::ChunkingConfig;
use crate::error::{Error, Result};

/// Splits text into fixed-size word windows that overlap
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Window size in words
    chunk_size: usize,
    /// Words shared by consecutive windows
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker; `overlap` must be smaller than `chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 || overlap >= chunk_size {
            return Err(Error::config(format!(
                "invalid chunking: overlap ({}) must be smaller than chunk_size ({})",
                overlap, chunk_size
            )));
        }
        Ok(Self { chunk_size, overlap })
    }

    /// Create from config
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Slide a window over whitespace-separated words, stepping by `chunk_size - overlap`
    ///
    /// Stops at the first window that reaches the end of the text. Windows that
    /// would start inside it are not emitted, unlike a plain stride loop: 450
    /// words at 500/100 give one chunk, not a second one holding words 400..450.
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text.split_whitespace().collect();
        let step = self.chunk_size - self.overlap;
        let mut chunks = Vec::new();

        let mut start = 0;
        while start < words.len() {
            let end = (start + self.chunk_size).min(words.len());
            let chunk = words[start..end].join(" ");
            if !chunk.trim().is_empty() {
                chunks.push(chunk);
            }
            if end == words.len() {
                break;
            }
            start += step;
        }

        chunks
    }
}

impl Default for TextChunker {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            overlap: 100,
        }
    }
}

/// Chunk `text` with the given window size and overlap
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Result<Vec<String>> {
    Ok(TextChunker::new(chunk_size, overlap)?.chunk_text(text))
}
