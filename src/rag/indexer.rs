//! Corpus to index pipeline: chunk every document, embed in batches, build.
//!
//! Per-document failures (embedding errors or timeouts) drop that document and
//! are reported; a dimension mismatch aborts the whole build.

use std::sync::Arc;
use std::time::Duration;

use crate::core::errors::TutorError;
use crate::llm::Embedder;
use crate::rag::chunker::Chunker;
use crate::rag::corpus::{Document, DocumentFailure};
use crate::rag::index::{EmbeddedChunk, VectorIndex};

#[derive(Debug, Clone)]
pub struct IndexReport {
    pub index: Arc<VectorIndex>,
    pub documents: usize,
    pub chunks: usize,
    pub failures: Vec<DocumentFailure>,
}

pub struct CorpusIndexer {
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    batch_size: usize,
    timeout: Duration,
}

impl CorpusIndexer {
    pub fn new(chunker: Chunker, embedder: Arc<dyn Embedder>, batch_size: usize, timeout: Duration) -> Self {
        Self {
            chunker,
            embedder,
            batch_size: batch_size.max(1),
            timeout,
        }
    }

    pub fn embedder(&self) -> Arc<dyn Embedder> {
        self.embedder.clone()
    }

    pub fn embedding_timeout(&self) -> Duration {
        self.timeout
    }

    /// `failures` carries documents that already failed to load so the report
    /// covers the whole corpus.
    pub async fn build(
        &self,
        documents: &[Document],
        mut failures: Vec<DocumentFailure>,
    ) -> Result<IndexReport, TutorError> {
        let mut entries: Vec<EmbeddedChunk> = Vec::new();
        let mut indexed_documents = 0;
        let mut expected_dimension: Option<usize> = None;

        for document in documents {
            let chunks = self.chunker.split(&document.id, &document.text);
            if chunks.is_empty() {
                tracing::debug!("Document {} is empty, skipping", document.id);
                continue;
            }

            let mut vectors: Vec<Vec<f32>> = Vec::with_capacity(chunks.len());
            let mut failed: Option<String> = None;
            for batch in chunks.chunks(self.batch_size) {
                let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
                match self.embed_batch(&texts).await {
                    Ok(batch_vectors) => vectors.extend(batch_vectors),
                    Err(err) => {
                        failed = Some(err.to_string());
                        break;
                    }
                }
            }

            if let Some(reason) = failed {
                tracing::warn!("Failed to embed {}: {}", document.id, reason);
                failures.push(DocumentFailure {
                    source: document.source.clone(),
                    reason,
                });
                continue;
            }

            for (chunk, vector) in chunks.into_iter().zip(vectors) {
                let dimension = *expected_dimension.get_or_insert(vector.len());
                if vector.len() != dimension {
                    return Err(TutorError::DimensionMismatch {
                        expected: dimension,
                        actual: vector.len(),
                        position: entries.len(),
                    });
                }
                entries.push(EmbeddedChunk { chunk, vector });
            }
            indexed_documents += 1;
        }

        let chunks = entries.len();
        let index = VectorIndex::build(entries)?;
        tracing::info!(
            "Indexed {} documents into {} chunks (dimension {}, {} failures, embedder {})",
            indexed_documents,
            chunks,
            index.dimension(),
            failures.len(),
            self.embedder.id()
        );

        Ok(IndexReport {
            index: Arc::new(index),
            documents: indexed_documents,
            chunks,
            failures,
        })
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, TutorError> {
        let vectors = tokio::time::timeout(self.timeout, self.embedder.embed(texts))
            .await
            .map_err(|_| {
                TutorError::EmbeddingUnavailable(format!("embedding timed out after {:?}", self.timeout))
            })??;
        if vectors.len() != texts.len() {
            return Err(TutorError::EmbeddingUnavailable(format!(
                "expected {} vectors, got {}",
                texts.len(),
                vectors.len()
            )));
        }
        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::llm::HashingEmbedder;
    use crate::rag::chunker::ChunkUnit;

    /// Fails for any batch containing `poison`.
    struct PoisonEmbedder {
        inner: HashingEmbedder,
        poison: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for PoisonEmbedder {
        fn id(&self) -> &str {
            "poison"
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, TutorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if inputs.iter().any(|t| t.contains(self.poison)) {
                return Err(TutorError::EmbeddingUnavailable("rate limited".to_string()));
            }
            self.inner.embed(inputs).await
        }
    }

    /// Returns vectors whose length depends on the input text.
    struct RaggedEmbedder;

    #[async_trait]
    impl Embedder for RaggedEmbedder {
        fn id(&self) -> &str {
            "ragged"
        }

        async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, TutorError> {
            Ok(inputs.iter().map(|t| vec![1.0; t.split_whitespace().count()]).collect())
        }
    }

    fn doc(id: &str, text: &str) -> Document {
        Document::new(id, text, format!("/corpus/{}", id))
    }

    #[tokio::test]
    async fn indexes_every_chunk_of_every_document() {
        let chunker = Chunker::new(3, 1, ChunkUnit::Token).expect("chunker");
        let embedder = Arc::new(HashingEmbedder::new(32).expect("embedder"));
        let indexer = CorpusIndexer::new(chunker, embedder, 2, Duration::from_secs(1));

        let docs = vec![doc("a.txt", "one two three four five"), doc("b.txt", "six")];
        let report = indexer.build(&docs, Vec::new()).await.expect("build");

        assert_eq!(report.documents, 2);
        assert_eq!(report.chunks, 3);
        assert_eq!(report.index.len(), 3);
        assert_eq!(report.index.dimension(), 32);
        assert!(report.failures.is_empty());
    }

    #[tokio::test]
    async fn embedding_failure_skips_only_that_document() {
        let chunker = Chunker::new(4, 0, ChunkUnit::Token).expect("chunker");
        let embedder = Arc::new(PoisonEmbedder {
            inner: HashingEmbedder::new(16).expect("embedder"),
            poison: "poison",
            calls: AtomicUsize::new(0),
        });
        let indexer = CorpusIndexer::new(chunker, embedder.clone(), 8, Duration::from_secs(1));

        let docs = vec![
            doc("good.txt", "a perfectly fine sentence"),
            doc("bad.txt", "this one contains poison"),
            doc("also_good.txt", "another fine sentence"),
        ];
        let prior = vec![DocumentFailure {
            source: "/corpus/broken.pdf".into(),
            reason: "unreadable".to_string(),
        }];
        let report = indexer.build(&docs, prior).await.expect("build");

        assert_eq!(report.documents, 2);
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[1].source.ends_with("bad.txt"));
        assert!(report
            .index
            .entries()
            .iter()
            .all(|e| e.chunk.doc_id != "bad.txt"));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn inconsistent_dimensions_abort_the_build() {
        let chunker = Chunker::new(10, 0, ChunkUnit::Token).expect("chunker");
        let indexer = CorpusIndexer::new(chunker, Arc::new(RaggedEmbedder), 4, Duration::from_secs(1));

        let docs = vec![doc("a.txt", "two words"), doc("b.txt", "now three words")];
        let err = indexer.build(&docs, Vec::new()).await.expect_err("mismatch");
        assert!(matches!(
            err,
            TutorError::DimensionMismatch {
                expected: 2,
                actual: 3,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn empty_corpus_builds_an_empty_index() {
        let chunker = Chunker::new(10, 2, ChunkUnit::Char).expect("chunker");
        let indexer = CorpusIndexer::new(
            chunker,
            Arc::new(HashingEmbedder::new(8).expect("embedder")),
            4,
            Duration::from_secs(1),
        );
        let report = indexer.build(&[doc("empty.txt", "")], Vec::new()).await.expect("build");
        assert!(report.index.is_empty());
        assert_eq!(report.documents, 0);
    }
}
