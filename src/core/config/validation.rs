use super::schema::{AppConfig, EmbeddingProviderKind};
use crate::core::errors::TutorError;

pub fn validate_config(config: &AppConfig) -> Result<(), TutorError> {
    validate_non_empty("llm.model", &config.llm.model)?;
    validate_non_empty("llm.base_url", &config.llm.base_url)?;
    validate_u64_field("llm.timeout_secs", config.llm.timeout_secs, 1, 86_400)?;
    if let Some(max_tokens) = config.llm.max_tokens {
        validate_u64_field("llm.max_tokens", max_tokens.max(0) as u64, 1, 1_000_000)?;
    }

    let rag = &config.rag;
    validate_u64_field("rag.chunk_size", rag.chunk_size as u64, 1, 1_000_000)?;
    if rag.chunk_overlap >= rag.chunk_size {
        return Err(TutorError::Config(format!(
            "Invalid config at 'rag.chunk_overlap': must be smaller than rag.chunk_size ({})",
            rag.chunk_size
        )));
    }
    validate_u64_field("rag.top_k", rag.top_k as u64, 1, 1_000)?;
    validate_u64_field("rag.max_context_chars", rag.max_context_chars as u64, 1, 10_000_000)?;

    let embedding = &rag.embedding;
    validate_u64_field("rag.embedding.timeout_secs", embedding.timeout_secs, 1, 86_400)?;
    validate_u64_field("rag.embedding.batch_size", embedding.batch_size as u64, 1, 10_000)?;
    match embedding.provider {
        EmbeddingProviderKind::Hashing => {
            validate_u64_field("rag.embedding.dimension", embedding.dimension as u64, 1, 65_536)?
        }
        EmbeddingProviderKind::Remote => validate_non_empty("rag.embedding.model", &embedding.model)?,
    }

    validate_non_empty("assistant.system_instruction", &config.assistant.system_instruction)?;
    Ok(())
}

fn validate_u64_field(path: &str, value: u64, min: u64, max: u64) -> Result<(), TutorError> {
    if value < min || value > max {
        return Err(TutorError::Config(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_non_empty(path: &str, value: &str) -> Result<(), TutorError> {
    if value.trim().is_empty() {
        return Err(TutorError::Config(format!(
            "Invalid config at '{}': must not be empty",
            path
        )));
    }
    Ok(())
}
