//! Overlapping fixed-size chunking.
//!
//! Text is first cut into units (words with their trailing whitespace, or
//! single characters), then a window of `max_length` units slides forward by
//! `max_length - overlap` units. Every chunk is a literal substring of the
//! document, so the chunks cover the input with no gaps and neighbours share
//! exactly `overlap` units.

use serde::{Deserialize, Serialize};

use crate::core::config::ChunkUnitSetting;
use crate::core::errors::TutorError;

/// Unit in which `max_length` and `overlap` are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChunkUnit {
    /// A whitespace-delimited word plus the whitespace that follows it.
    Token,
    /// A single Unicode scalar value.
    Char,
}

impl From<ChunkUnitSetting> for ChunkUnit {
    fn from(setting: ChunkUnitSetting) -> Self {
        match setting {
            ChunkUnitSetting::Token => ChunkUnit::Token,
            ChunkUnitSetting::Char => ChunkUnit::Char,
        }
    }
}

/// A contiguous span of one document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Identifier of the parent document.
    pub doc_id: String,
    /// Position of this chunk within the document, starting at 0.
    pub ordinal: usize,
    /// Byte offset of the first character in the document text.
    pub start: usize,
    /// Byte offset one past the last character.
    pub end: usize,
    /// The literal substring `document[start..end]`.
    pub text: String,
    /// Window size, in units, the chunk was cut with.
    pub max_length: usize,
    /// Units shared with the preceding chunk; 0 for the first.
    pub overlap: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    max_length: usize,
    overlap: usize,
    unit: ChunkUnit,
}

impl Chunker {
    pub fn new(max_length: usize, overlap: usize, unit: ChunkUnit) -> Result<Self, TutorError> {
        if max_length == 0 {
            return Err(TutorError::InvalidParameter(
                "max_length must be greater than 0".to_string(),
            ));
        }
        if overlap >= max_length {
            return Err(TutorError::InvalidParameter(format!(
                "overlap ({}) must be smaller than max_length ({})",
                overlap, max_length
            )));
        }
        Ok(Self {
            max_length,
            overlap,
            unit,
        })
    }

    pub fn split(&self, doc_id: &str, text: &str) -> Vec<Chunk> {
        let bounds = match self.unit {
            ChunkUnit::Token => token_boundaries(text),
            ChunkUnit::Char => char_boundaries(text),
        };
        let units = bounds.len().saturating_sub(1);

        let mut chunks = Vec::new();
        if units == 0 {
            return chunks;
        }

        let step = self.max_length - self.overlap;
        let mut start = 0;
        loop {
            let end = (start + self.max_length).min(units);
            let (byte_start, byte_end) = (bounds[start], bounds[end]);
            chunks.push(Chunk {
                doc_id: doc_id.to_string(),
                ordinal: chunks.len(),
                start: byte_start,
                end: byte_end,
                text: text[byte_start..byte_end].to_string(),
                max_length: self.max_length,
                overlap: if start == 0 { 0 } else { self.overlap },
            });
            if end == units {
                break;
            }
            start += step;
        }

        chunks
    }
}

/// Byte offsets where units begin, followed by `text.len()`.
fn char_boundaries(text: &str) -> Vec<usize> {
    if text.is_empty() {
        return Vec::new();
    }
    text.char_indices()
        .map(|(idx, _)| idx)
        .chain(std::iter::once(text.len()))
        .collect()
}

fn token_boundaries(text: &str) -> Vec<usize> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut bounds = vec![0];
    let mut seen_word = false;
    let mut prev_whitespace = false;
    for (idx, ch) in text.char_indices() {
        let whitespace = ch.is_whitespace();
        // Leading whitespace belongs to the first token.
        if !whitespace && prev_whitespace && seen_word {
            bounds.push(idx);
        }
        if !whitespace {
            seen_word = true;
        }
        prev_whitespace = whitespace;
    }
    bounds.push(text.len());
    bounds
}
