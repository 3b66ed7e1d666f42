pub mod paths;
pub mod schema;
pub mod service;
pub mod validation;

pub use paths::AppPaths;
pub use schema::{
    AppConfig, AssistantConfig, ChunkUnitSetting, EmbeddingConfig, EmbeddingProviderKind,
    LlmConfig, RagConfig, RetrievalFailureSetting, ServerConfig,
};
pub use service::ConfigService;
pub use validation::validate_config;
