use thiserror::Error;

use crate::core::errors::TutorError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to load configuration: {0}")]
    Config(#[source] TutorError),

    #[error("Failed to initialize completion provider: {0}")]
    Llm(#[source] TutorError),

    #[error("Failed to initialize retrieval: {0}")]
    Rag(#[source] TutorError),
}
