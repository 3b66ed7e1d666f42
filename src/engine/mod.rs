//! Conversation engine: one session, retrieval optional.
//!
//! `ask` runs under the conversation lock, so concurrent callers are
//! serialized. The vector index is published behind its own lock as an
//! immutable `Arc`; a rebuild constructs a fresh index and swaps it in whole.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{Mutex, RwLock};

use crate::context::PromptAssembler;
use crate::core::config::{AppConfig, LlmConfig, RetrievalFailureSetting};
use crate::core::errors::TutorError;
use crate::history::{ConversationState, Role, Turn};
use crate::llm::{ChatRequest, CompletionProvider};
use crate::rag::{
    CorpusIndexer, DirectorySource, Document, DocumentFailure, IndexReport, RetrievalResult, Retriever,
    VectorIndex,
};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Ready,
    Indexing,
}

/// What `ask` does when the embedding capability fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetrievalFailurePolicy {
    /// Answer without context and flag the answer as degraded.
    Degrade,
    /// Surface `EmbeddingUnavailable` to the caller.
    Fail,
}

impl From<RetrievalFailureSetting> for RetrievalFailurePolicy {
    fn from(setting: RetrievalFailureSetting) -> Self {
        match setting {
            RetrievalFailureSetting::Degrade => RetrievalFailurePolicy::Degrade,
            RetrievalFailureSetting::Fail => RetrievalFailurePolicy::Fail,
        }
    }
}

/// How an answer was produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Grounding {
    /// Retrieved corpus context was included in the prompt.
    Context { sources: Vec<String> },
    /// No retrieval configured, or the index had nothing to offer.
    Plain,
    /// Retrieval failed; the answer was generated without context.
    Degraded { reason: String },
}

impl Grounding {
    pub fn is_degraded(&self) -> bool {
        matches!(self, Grounding::Degraded { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Answer {
    pub text: String,
    pub grounding: Grounding,
}

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub llm: LlmConfig,
    pub system_instruction: String,
    pub top_k: usize,
    pub failure_policy: RetrievalFailurePolicy,
    pub max_context_chars: usize,
    pub include_citations: bool,
}

impl EngineSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            llm: config.llm.clone(),
            system_instruction: config.assistant.system_instruction.clone(),
            top_k: config.rag.top_k,
            failure_policy: config.rag.on_retrieval_failure.into(),
            max_context_chars: config.rag.max_context_chars,
            include_citations: config.rag.include_citations,
        }
    }

    fn completion_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

pub struct ConversationEngine {
    settings: EngineSettings,
    completion: Arc<dyn CompletionProvider>,
    indexer: Option<CorpusIndexer>,
    assembler: PromptAssembler,
    conversation: Mutex<ConversationState>,
    index: RwLock<Option<Arc<VectorIndex>>>,
    indexing: AtomicBool,
}

/// Flips the engine back to `Ready` however the rebuild ends.
struct IndexingGuard<'a>(&'a AtomicBool);

impl Drop for IndexingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

impl ConversationEngine {
    /// An engine without retrieval; every answer is `Grounding::Plain`.
    pub fn new(settings: EngineSettings, completion: Arc<dyn CompletionProvider>) -> Self {
        let assembler = PromptAssembler::new(settings.max_context_chars, settings.include_citations);
        let conversation = ConversationState::new(&settings.system_instruction);
        Self {
            settings,
            completion,
            indexer: None,
            assembler,
            conversation: Mutex::new(conversation),
            index: RwLock::new(None),
            indexing: AtomicBool::new(false),
        }
    }

    /// Enable retrieval. No index is published until the first rebuild.
    pub fn with_retrieval(mut self, indexer: CorpusIndexer) -> Self {
        self.indexer = Some(indexer);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn completion_provider(&self) -> Arc<dyn CompletionProvider> {
        self.completion.clone()
    }

    pub fn retrieval_enabled(&self) -> bool {
        self.indexer.is_some()
    }

    pub fn state(&self) -> EngineState {
        if self.indexing.load(Ordering::SeqCst) {
            EngineState::Indexing
        } else {
            EngineState::Ready
        }
    }

    /// Number of chunks in the published index; `None` before the first build.
    pub async fn index_size(&self) -> Option<usize> {
        self.index.read().await.as_ref().map(|index| index.len())
    }

    pub async fn conversation_snapshot(&self) -> Vec<Turn> {
        self.conversation.lock().await.snapshot()
    }

    pub async fn turn_count(&self) -> usize {
        self.conversation.lock().await.len()
    }

    /// Clear the conversation back to the configured system instruction.
    pub async fn reset_conversation(&self) {
        let mut conversation = self.conversation.lock().await;
        conversation.reset(&self.settings.system_instruction);
        tracing::info!("Conversation reset");
    }

    /// Answer one user query.
    ///
    /// The user turn is appended first and stays in the log even if the
    /// completion later fails. Embedding failures degrade or fail according
    /// to the configured policy; completion failures always surface.
    pub async fn ask(&self, query: &str) -> Result<Answer, TutorError> {
        if self.state() == EngineState::Indexing {
            return Err(TutorError::IndexNotReady);
        }

        let mut conversation = self.conversation.lock().await;
        conversation.push(Role::User, query);

        let (retrieval, grounding) = self.retrieve(query).await?;
        let messages = self.assembler.assemble(conversation.turns(), &retrieval);
        let request = ChatRequest::new(messages).with_config(&self.settings.llm);

        let timeout = self.settings.completion_timeout();
        let model = self.settings.llm.model.as_str();
        let text = match tokio::time::timeout(timeout, self.completion.chat(request, model)).await {
            Ok(Ok(text)) => text,
            Ok(Err(err)) => {
                let err = match err {
                    TutorError::CompletionUnavailable(_) => err,
                    other => TutorError::completion(other),
                };
                tracing::error!("Completion via {} failed: {}", self.completion.name(), err);
                return Err(err);
            }
            Err(_) => {
                tracing::error!("Completion via {} timed out after {:?}", self.completion.name(), timeout);
                return Err(TutorError::CompletionUnavailable(format!(
                    "completion timed out after {:?}",
                    timeout
                )));
            }
        };

        conversation.push(Role::Assistant, &text);
        Ok(Answer { text, grounding })
    }

    async fn retrieve(&self, query: &str) -> Result<(RetrievalResult, Grounding), TutorError> {
        let Some(indexer) = &self.indexer else {
            return Ok((RetrievalResult::empty(), Grounding::Plain));
        };
        let Some(index) = self.index.read().await.clone() else {
            return Ok((RetrievalResult::empty(), Grounding::Plain));
        };

        let retriever = Retriever::new(index, indexer.embedder(), indexer.embedding_timeout());
        match retriever.retrieve(query, self.settings.top_k).await {
            Ok(result) if result.is_empty() => Ok((result, Grounding::Plain)),
            Ok(result) => {
                let sources = result.sources();
                Ok((result, Grounding::Context { sources }))
            }
            Err(err @ TutorError::EmbeddingUnavailable(_)) => match self.settings.failure_policy {
                RetrievalFailurePolicy::Degrade => {
                    tracing::warn!("Retrieval failed, answering without context: {}", err);
                    Ok((
                        RetrievalResult::empty(),
                        Grounding::Degraded {
                            reason: err.to_string(),
                        },
                    ))
                }
                RetrievalFailurePolicy::Fail => Err(err),
            },
            Err(err) => Err(err),
        }
    }

    /// Load `root` through `source` and rebuild the index from it.
    pub async fn index_directory(&self, source: &DirectorySource, root: &Path) -> Result<IndexReport, TutorError> {
        let _guard = self.begin_indexing()?;
        let load = source.load(root)?;
        self.build_and_publish(&load.documents, load.failures).await
    }

    /// Build a new index from `documents` and publish it atomically.
    ///
    /// `ask` is rejected with `IndexNotReady` while this runs. On failure the
    /// previously published index stays in place.
    pub async fn rebuild_index(
        &self,
        documents: &[Document],
        failures: Vec<DocumentFailure>,
    ) -> Result<IndexReport, TutorError> {
        let _guard = self.begin_indexing()?;
        self.build_and_publish(documents, failures).await
    }

    fn begin_indexing(&self) -> Result<IndexingGuard<'_>, TutorError> {
        if self.indexer.is_none() {
            return Err(TutorError::Config("retrieval is disabled".to_string()));
        }
        self.indexing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| TutorError::IndexNotReady)?;
        tracing::info!("Engine state: indexing");
        Ok(IndexingGuard(&self.indexing))
    }

    async fn build_and_publish(
        &self,
        documents: &[Document],
        failures: Vec<DocumentFailure>,
    ) -> Result<IndexReport, TutorError> {
        let Some(indexer) = &self.indexer else {
            return Err(TutorError::Config("retrieval is disabled".to_string()));
        };

        let report = match indexer.build(documents, failures).await {
            Ok(report) => report,
            Err(err) => {
                tracing::error!("Index rebuild failed, keeping previous index: {}", err);
                return Err(err);
            }
        };

        *self.index.write().await = Some(report.index.clone());
        tracing::info!("Published index with {} chunks", report.chunks);
        Ok(report)
    }
}
