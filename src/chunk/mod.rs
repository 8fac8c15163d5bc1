//! Text chunking with boundary awareness
//!
//! Splits extracted document text into overlapping windows while:
//! - Preferring paragraph, then sentence, then word boundaries over hard cuts
//! - Keeping every chunk within the configured size
//! - Producing stable, deterministic output for identical input

mod boundaries;

pub use boundaries::*;

use crate::config::ChunkConfig;
use crate::error::{Error, Result};
use blake3::Hasher;
use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

/// A chunk of a source document, ready for indexing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    /// The chunk text
    pub content: String,

    /// Identifier of the originating document
    pub source_id: String,

    /// Display name of the originating document (file name)
    pub source_name: String,

    /// Chunk index within the source (0-based)
    pub chunk_index: usize,

    /// Total chunks produced for the source at insertion time
    pub chunk_count: usize,
}

impl ChunkRecord {
    /// Identity key, unique within the index store
    pub fn identity_key(&self) -> String {
        format!("{}_{}", self.source_name, self.chunk_index)
    }

    /// Check the record's internal invariants
    pub fn validate(&self) -> Result<()> {
        if self.source_name.is_empty() {
            return Err(Error::IndexWrite("chunk has empty source name".to_string()));
        }
        if self.chunk_count == 0 || self.chunk_index >= self.chunk_count {
            return Err(Error::IndexWrite(format!(
                "chunk index {} out of range for count {}",
                self.chunk_index, self.chunk_count
            )));
        }
        Ok(())
    }
}

/// Split text into overlapping chunks of at most `chunk_size` bytes each
///
/// Consecutive chunks overlap by approximately `chunk_overlap` bytes, snapped
/// back to a word boundary where one intervenes. Empty input yields an empty
/// vector.
pub fn split_text(text: &str, config: &ChunkConfig) -> Result<Vec<String>> {
    let size = config.chunk_size;
    let overlap = config.chunk_overlap;

    if size == 0 || overlap >= size {
        return Err(Error::InvalidConfig(format!(
            "chunk_overlap ({}) must be smaller than chunk_size ({})",
            overlap, size
        )));
    }

    if text.is_empty() {
        return Ok(Vec::new());
    }
    if text.len() <= size {
        return Ok(vec![text.to_string()]);
    }

    let break_points = find_break_points(text);
    let mut chunks = Vec::new();
    let mut start = 0;

    loop {
        let target = start + size;
        if target >= text.len() {
            chunks.push(text[start..].to_string());
            break;
        }

        let mut end = find_best_break(text, start, target, overlap, &break_points);
        if end <= start {
            // Force progress past at least one character
            end = start
                + text[start..]
                    .chars()
                    .next()
                    .map(|c| c.len_utf8())
                    .unwrap_or(1);
        }

        chunks.push(text[start..end].to_string());
        if end >= text.len() {
            break;
        }
        start = next_chunk_start(text, start, end, overlap);
    }

    Ok(chunks)
}

/// Split a document's text and wrap each piece in a `ChunkRecord`
pub fn chunk_source(
    text: &str,
    source_name: &str,
    config: &ChunkConfig,
) -> Result<Vec<ChunkRecord>> {
    let pieces = split_text(text, config)?;
    let chunk_count = pieces.len();
    let source_id = Uuid::new_v4().to_string();

    Ok(pieces
        .into_iter()
        .enumerate()
        .map(|(chunk_index, content)| ChunkRecord {
            content,
            source_id: source_id.clone(),
            source_name: source_name.to_string(),
            chunk_index,
            chunk_count,
        })
        .collect())
}

/// Find the best break position in (start, target], preferring paragraph over
/// sentence over word boundaries
fn find_best_break(
    text: &str,
    start: usize,
    target: usize,
    overlap: usize,
    break_points: &[BreakPoint],
) -> usize {
    // The window's lower bound keeps chunks from collapsing below the overlap,
    // which would stall forward progress
    let window_lo = start + std::cmp::max(target.saturating_sub(start) * 3 / 5, overlap + 1);
    let window_lo = ensure_char_boundary(text, std::cmp::min(window_lo, target));

    if let Some(best) = break_points
        .iter()
        .filter(|p| p.position >= window_lo && p.position <= target)
        .max_by_key(|p| (p.priority, p.position))
    {
        return best.position;
    }

    // Fall back to the last word boundary inside the window
    let slice_end = ensure_char_boundary(text, target);
    if window_lo < slice_end {
        let slice = &text[window_lo..slice_end];
        if let Some((idx, _)) = slice.split_word_bound_indices().last() {
            if idx > 0 {
                return window_lo + idx;
            }
        }
    }

    // Hard character cut
    ensure_char_boundary(text, target)
}

/// Compute where the next chunk starts given the previous chunk's end,
/// stepping back by the overlap and aligning to a word boundary
fn next_chunk_start(text: &str, start: usize, end: usize, overlap: usize) -> usize {
    let raw = end.saturating_sub(overlap);
    let mut pos = ensure_char_boundary(text, raw);
    if pos <= start {
        return end;
    }

    // Starting mid-word would repeat a fragment of a word; advance past the
    // next whitespace run inside the overlap instead
    let at_word_start = text[..pos].ends_with(|c: char| c.is_whitespace());
    if !at_word_start {
        if let Some(rel) = text[pos..end].find(char::is_whitespace) {
            let mut p = pos + rel;
            while p < end {
                match text[p..].chars().next() {
                    Some(c) if c.is_whitespace() => p += c.len_utf8(),
                    _ => break,
                }
            }
            if p < end {
                pos = p;
            }
        }
    }

    pos
}

/// Compute a stable hash for document content
pub fn compute_content_hash(content: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(content);
    hasher.finalize().to_hex().to_string()
}
