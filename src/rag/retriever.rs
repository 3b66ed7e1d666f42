use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::core::errors::TutorError;
use crate::llm::Embedder;
use crate::rag::chunker::Chunk;
use crate::rag::index::VectorIndex;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RetrievedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// Hits for one query, best first. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RetrievalResult {
    pub hits: Vec<RetrievedChunk>,
}

impl RetrievalResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Distinct source documents, in hit order.
    pub fn sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = Vec::new();
        for hit in &self.hits {
            if !sources.contains(&hit.chunk.doc_id) {
                sources.push(hit.chunk.doc_id.clone());
            }
        }
        sources
    }
}

/// Embeds a query and looks it up in one published index.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<VectorIndex>,
    embedder: Arc<dyn Embedder>,
    timeout: Duration,
}

impl Retriever {
    pub fn new(index: Arc<VectorIndex>, embedder: Arc<dyn Embedder>, timeout: Duration) -> Self {
        Self {
            index,
            embedder,
            timeout,
        }
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult, TutorError> {
        if k == 0 {
            return Err(TutorError::InvalidParameter(
                "k must be greater than 0".to_string(),
            ));
        }
        if self.index.is_empty() {
            return Ok(RetrievalResult::empty());
        }

        let inputs = [query.to_string()];
        let vector = match tokio::time::timeout(self.timeout, self.embedder.embed(&inputs)).await {
            Ok(result) => result
                .map_err(|e| match e {
                    TutorError::EmbeddingUnavailable(_) => e,
                    other => TutorError::embedding(other),
                })?
                .into_iter()
                .next()
                .ok_or_else(|| TutorError::embedding("embedder returned no vector for the query"))?,
            Err(_) => {
                return Err(TutorError::EmbeddingUnavailable(format!(
                    "query embedding timed out after {:?}",
                    self.timeout
                )))
            }
        };

        let hits = self
            .index
            .query(&vector, k)?
            .into_iter()
            .map(|(chunk, score)| RetrievedChunk { chunk, score })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Retrieved {} chunks for query (top score {:?})",
            hits.len(),
            hits.first().map(|h| h.score)
        );
        Ok(RetrievalResult { hits })
    }
}
