use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::TutorError;

#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// provider name used in logs (e.g. "openai", "mock")
    fn name(&self) -> &str;

    /// check if the provider is reachable
    async fn health_check(&self) -> Result<bool, TutorError>;

    /// chat completion (non-streaming); returns the reply text
    async fn chat(&self, request: ChatRequest, model_id: &str) -> Result<String, TutorError>;
}

#[async_trait]
pub trait Embedder: Send + Sync {
    /// stable identifier of the embedding model
    fn id(&self) -> &str;

    /// one vector per input, in input order
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>, TutorError>;
}
