//! In-memory vector index over embedded chunks.
//!
//! Immutable once built. A rebuilt corpus produces a fresh index that is
//! swapped in whole, so readers never see a half-populated index.

use crate::core::errors::TutorError;
use crate::rag::chunker::Chunk;
use crate::vector_math::rank_descending_by_cosine;

#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    pub chunk: Chunk,
    pub vector: Vec<f32>,
}

#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<EmbeddedChunk>,
    dimension: usize,
}

impl VectorIndex {
    /// Build an index; every vector must share the first entry's dimension.
    pub fn build(entries: Vec<EmbeddedChunk>) -> Result<Self, TutorError> {
        let dimension = entries.first().map(|e| e.vector.len()).unwrap_or(0);
        for (position, entry) in entries.iter().enumerate() {
            if entry.vector.len() != dimension {
                return Err(TutorError::DimensionMismatch {
                    expected: dimension,
                    actual: entry.vector.len(),
                    position,
                });
            }
        }
        Ok(Self { entries, dimension })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Zero for an empty index.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn entries(&self) -> &[EmbeddedChunk] {
        &self.entries
    }

    /// The `min(k, len)` entries most similar to `vector`, best first.
    /// Equal scores keep insertion order.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<(Chunk, f32)>, TutorError> {
        if k == 0 {
            return Err(TutorError::InvalidParameter(
                "k must be greater than 0".to_string(),
            ));
        }
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        if vector.len() != self.dimension {
            return Err(TutorError::DimensionMismatch {
                expected: self.dimension,
                actual: vector.len(),
                position: 0,
            });
        }

        let candidates: Vec<&[f32]> = self.entries.iter().map(|e| e.vector.as_slice()).collect();
        let ranked = rank_descending_by_cosine(vector, &candidates);

        Ok(ranked
            .into_iter()
            .take(k)
            .map(|(idx, score)| (self.entries[idx].chunk.clone(), score))
            .collect())
    }
}
