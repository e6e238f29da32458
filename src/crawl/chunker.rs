//! Sliding-window text chunking
//!
//! Splits page text into chunks of roughly `chunk_size` characters with
//! `chunk_overlap` characters shared between consecutive chunks. Chunk
//! boundaries back up to the nearest natural break — paragraph, sentence,
//! newline, word — before falling back to a hard character cut.

use crate::config::ChunkingConfig;
use crate::types::{CrawlUrl, DocumentChunk, JobId, PageMetadata, UserId};

/// Text splitter with fixed target size and overlap (in characters)
pub struct TextChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker. `chunk_overlap` is clamped below `chunk_size`.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn from_config(config: &ChunkingConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Split text into overlapping chunks. Deterministic: the same text
    /// always yields the same chunks in the same order. The final chunk may
    /// be shorter than `chunk_size`.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let len = chars.len();

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < len {
            let end = (start + self.chunk_size).min(len);
            let split_end = if end >= len {
                len
            } else {
                self.find_split_point(&chars, start, end)
            };

            let chunk: String = chars[start..split_end].iter().collect();
            let trimmed = chunk.trim();
            if !trimmed.is_empty() {
                chunks.push(trimmed.to_string());
            }

            if split_end >= len {
                break;
            }
            start = split_end
                .saturating_sub(self.chunk_overlap)
                .max(start + 1);
        }

        chunks
    }

    /// Split a page's text and tag each chunk with its index, source URL,
    /// page metadata, and owning user/job.
    pub fn chunk_page(
        &self,
        source: &CrawlUrl,
        text: &str,
        metadata: &PageMetadata,
        user_id: UserId,
        job_id: JobId,
    ) -> Vec<DocumentChunk> {
        self.split(text)
            .into_iter()
            .enumerate()
            .map(|(chunk_index, content)| DocumentChunk {
                content,
                source: source.as_str().to_string(),
                chunk_index,
                metadata: metadata.clone(),
                user_id,
                job_id,
            })
            .collect()
    }

    /// Find a natural boundary at or before `target_end`, searching back at
    /// most a fifth of the chunk size: paragraph break, then sentence end,
    /// then newline, then whitespace, else the hard cut.
    fn find_split_point(&self, chars: &[char], start: usize, target_end: usize) -> usize {
        let search_start = target_end
            .saturating_sub((self.chunk_size / 5).max(1))
            .max(start + 1);

        for i in (search_start..target_end).rev() {
            if i + 1 < chars.len() && chars[i] == '\n' && chars[i + 1] == '\n' {
                return i + 2;
            }
        }

        for i in (search_start..target_end).rev() {
            let c = chars[i];
            if (c == '.' || c == '!' || c == '?')
                && (i + 1 >= chars.len() || chars[i + 1].is_whitespace())
            {
                return i + 1;
            }
        }

        for i in (search_start..target_end).rev() {
            if chars[i] == '\n' {
                return i + 1;
            }
        }

        for i in (search_start..target_end).rev() {
            if chars[i].is_whitespace() {
                return i + 1;
            }
        }

        target_end
    }
}
