use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::core::config::{validate_config, AppConfig, AppPaths, ConfigService, EmbeddingProviderKind};
use crate::core::errors::TutorError;
use crate::engine::{ConversationEngine, EngineSettings};
use crate::llm::{CompletionProvider, Embedder, HashingEmbedder, OpenAiProvider, RemoteEmbedder};
use crate::rag::{Chunker, CorpusIndexer, DirectorySource, IndexReport};

pub mod error;

use error::InitializationError;

/// Application state shared by the console loop and the HTTP routes.
///
/// Holds the single conversation engine for this process plus what is needed
/// to re-index the corpus on demand.
#[derive(Clone)]
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub config: Arc<AppConfig>,
    pub engine: Arc<ConversationEngine>,
    pub corpus_root: PathBuf,
    pub source: Arc<DirectorySource>,
}

impl AppState {
    /// Load configuration and build the engine against the configured endpoint.
    ///
    /// Fails when the API key variable is unset. The index is not built here;
    /// call `index_corpus` once the state exists.
    pub fn initialize(paths: Arc<AppPaths>) -> Result<Arc<Self>, InitializationError> {
        let config_service = ConfigService::new(paths.clone());
        let config = config_service
            .load_config()
            .map_err(InitializationError::Config)?;
        let api_key = config_service
            .api_key(&config)
            .map_err(InitializationError::Config)?;

        let provider = OpenAiProvider::new(
            &config.llm.base_url,
            Some(api_key.clone()),
            Duration::from_secs(config.llm.timeout_secs),
        )
        .map_err(InitializationError::Llm)?;

        tracing::info!(
            "Using model {} at {} (retrieval {})",
            config.llm.model,
            config.llm.base_url,
            if config.rag.enabled { "enabled" } else { "disabled" }
        );

        Self::from_parts(paths, config, Arc::new(provider), Some(api_key)).map(Arc::new)
    }

    /// Wire the engine around an already-built completion provider.
    ///
    /// `api_key` is only consulted by the remote embedder.
    pub fn from_parts(
        paths: Arc<AppPaths>,
        config: AppConfig,
        completion: Arc<dyn CompletionProvider>,
        api_key: Option<String>,
    ) -> Result<Self, InitializationError> {
        validate_config(&config).map_err(InitializationError::Config)?;

        let mut engine = ConversationEngine::new(EngineSettings::from_config(&config), completion);
        if config.rag.enabled {
            let indexer = build_indexer(&config, api_key).map_err(InitializationError::Rag)?;
            engine = engine.with_retrieval(indexer);
        }

        let corpus_root = paths.resolve(&config.rag.corpus_dir);
        Ok(Self {
            paths,
            config: Arc::new(config),
            engine: Arc::new(engine),
            corpus_root,
            source: Arc::new(DirectorySource::new()),
        })
    }

    /// Re-read the corpus directory and publish a fresh index.
    pub async fn index_corpus(&self) -> Result<IndexReport, TutorError> {
        self.engine
            .index_directory(&self.source, &self.corpus_root)
            .await
    }
}

/// Chunker and embedder as configured under `rag`.
pub fn build_indexer(config: &AppConfig, api_key: Option<String>) -> Result<CorpusIndexer, TutorError> {
    let embedder = build_embedder(config, api_key)?;
    let chunker = Chunker::new(
        config.rag.chunk_size,
        config.rag.chunk_overlap,
        config.rag.chunk_unit.into(),
    )?;
    Ok(CorpusIndexer::new(
        chunker,
        embedder,
        config.rag.embedding.batch_size,
        Duration::from_secs(config.rag.embedding.timeout_secs),
    ))
}

pub fn build_embedder(config: &AppConfig, api_key: Option<String>) -> Result<Arc<dyn Embedder>, TutorError> {
    let embedding = &config.rag.embedding;
    match embedding.provider {
        EmbeddingProviderKind::Hashing => Ok(Arc::new(HashingEmbedder::new(embedding.dimension)?)),
        EmbeddingProviderKind::Remote => {
            let provider = OpenAiProvider::new(
                &config.llm.base_url,
                api_key,
                Duration::from_secs(embedding.timeout_secs),
            )?;
            Ok(Arc::new(RemoteEmbedder::new(provider, embedding.model.clone())))
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::engine::Grounding;
    use crate::llm::ChatRequest;

    struct EchoCompletion;

    #[async_trait]
    impl CompletionProvider for EchoCompletion {
        fn name(&self) -> &str {
            "echo"
        }

        async fn health_check(&self) -> Result<bool, TutorError> {
            Ok(true)
        }

        async fn chat(&self, request: ChatRequest, _model_id: &str) -> Result<String, TutorError> {
            Ok(request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default())
        }
    }

    fn paths(tmp: &tempfile::TempDir) -> Arc<AppPaths> {
        Arc::new(AppPaths::with_data_dir(
            tmp.path().to_path_buf(),
            tmp.path().join("data"),
        ))
    }

    #[tokio::test]
    async fn indexes_the_configured_corpus_directory() {
        let tmp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(tmp.path().join("corpus")).expect("mkdir");
        std::fs::write(tmp.path().join("corpus/cat.txt"), "The cat sat on the mat.").expect("write");

        let state = AppState::from_parts(paths(&tmp), AppConfig::default(), Arc::new(EchoCompletion), None)
            .expect("state");
        assert_eq!(state.corpus_root, tmp.path().join("corpus"));

        let report = state.index_corpus().await.expect("index");
        assert_eq!(report.documents, 1);

        let answer = state.engine.ask("Where did the cat sit?").await.expect("ask");
        assert!(matches!(answer.grounding, Grounding::Context { .. }));
        assert!(answer.text.contains("cat.txt"));
    }

    #[tokio::test]
    async fn disabled_retrieval_builds_a_plain_engine() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.rag.enabled = false;

        let state = AppState::from_parts(paths(&tmp), config, Arc::new(EchoCompletion), None).expect("state");
        assert!(!state.engine.retrieval_enabled());
        let answer = state.engine.ask("hello").await.expect("ask");
        assert_eq!(answer.grounding, Grounding::Plain);
        assert_eq!(answer.text, "hello");
    }

    #[test]
    fn invalid_chunk_settings_fail_before_wiring() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let mut config = AppConfig::default();
        config.rag.chunk_overlap = config.rag.chunk_size;

        let result = AppState::from_parts(paths(&tmp), config, Arc::new(EchoCompletion), None);
        assert!(matches!(result, Err(InitializationError::Config(TutorError::Config(_)))));
    }

    #[test]
    fn remote_embedder_uses_configured_model() {
        let mut config = AppConfig::default();
        config.rag.embedding.provider = EmbeddingProviderKind::Remote;
        config.rag.embedding.model = "text-embedding-3-small".to_string();

        let embedder = build_embedder(&config, Some("key".to_string())).expect("embedder");
        assert_eq!(embedder.id(), "text-embedding-3-small");
    }
}
