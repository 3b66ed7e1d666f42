//! Typed configuration tree.
//!
//! Every section carries `#[serde(default)]`, so a missing `config.yml` (or a
//! partial one) still yields a complete configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub const DEFAULT_SYSTEM_INSTRUCTION: &str =
    "You are an english teacher. Correct mistakes in given sentences.";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmConfig,
    pub assistant: AssistantConfig,
    pub rag: RagConfig,
    pub server: ServerConfig,
}

/// Chat-completion endpoint (any OpenAI-compatible API; Groq by default).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub temperature: Option<f64>,
    pub max_tokens: Option<i32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.groq.com/openai".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            api_key_env: "GROQ_API_KEY".to_string(),
            timeout_secs: 60,
            temperature: None,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub system_instruction: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkUnitSetting {
    Token,
    Char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalFailureSetting {
    Degrade,
    Fail,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub enabled: bool,
    pub corpus_dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub chunk_unit: ChunkUnitSetting,
    pub top_k: usize,
    pub max_context_chars: usize,
    pub include_citations: bool,
    pub on_retrieval_failure: RetrievalFailureSetting,
    pub embedding: EmbeddingConfig,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            corpus_dir: PathBuf::from("corpus"),
            chunk_size: 200,
            chunk_overlap: 40,
            chunk_unit: ChunkUnitSetting::Token,
            top_k: 3,
            max_context_chars: 4000,
            include_citations: true,
            on_retrieval_failure: RetrievalFailureSetting::Degrade,
            embedding: EmbeddingConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    /// Local feature-hashing embedder; no network.
    Hashing,
    /// `/v1/embeddings` on the configured LLM endpoint.
    Remote,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub model: String,
    pub dimension: usize,
    pub timeout_secs: u64,
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Hashing,
            model: "nomic-embed-text-v1.5".to_string(),
            dimension: 384,
            timeout_secs: 10,
            batch_size: 32,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Browser origins allowed by CORS; empty means local development origins.
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            allowed_origins: Vec::new(),
        }
    }
}
