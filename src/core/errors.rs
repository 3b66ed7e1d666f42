use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TutorError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("invalid role: {0}")]
    InvalidRole(String),
    #[error("dimension mismatch at entry {position}: expected {expected}, got {actual}")]
    DimensionMismatch {
        expected: usize,
        actual: usize,
        position: usize,
    },
    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(String),
    #[error("completion unavailable: {0}")]
    CompletionUnavailable(String),
    #[error("index not ready: corpus indexing in progress")]
    IndexNotReady,
    #[error("corpus error: {0}")]
    Corpus(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl TutorError {
    pub fn invalid_parameter<E: std::fmt::Display>(err: E) -> Self {
        TutorError::InvalidParameter(err.to_string())
    }

    pub fn embedding<E: std::fmt::Display>(err: E) -> Self {
        TutorError::EmbeddingUnavailable(err.to_string())
    }

    pub fn completion<E: std::fmt::Display>(err: E) -> Self {
        TutorError::CompletionUnavailable(err.to_string())
    }

    /// Stable identifier used by the HTTP surface and in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            TutorError::InvalidParameter(_) => "invalid_parameter",
            TutorError::InvalidRole(_) => "invalid_role",
            TutorError::DimensionMismatch { .. } => "dimension_mismatch",
            TutorError::EmbeddingUnavailable(_) => "embedding_unavailable",
            TutorError::CompletionUnavailable(_) => "completion_unavailable",
            TutorError::IndexNotReady => "index_not_ready",
            TutorError::Corpus(_) => "corpus",
            TutorError::Config(_) => "config",
        }
    }

    /// External dependency failures; everything else is a caller or data error.
    pub fn is_external(&self) -> bool {
        matches!(
            self,
            TutorError::EmbeddingUnavailable(_) | TutorError::CompletionUnavailable(_)
        )
    }
}

impl IntoResponse for TutorError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            err if err.is_external() => StatusCode::SERVICE_UNAVAILABLE,
            TutorError::IndexNotReady => StatusCode::SERVICE_UNAVAILABLE,
            TutorError::InvalidParameter(_) | TutorError::InvalidRole(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({ "error": self.to_string(), "kind": self.kind() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn external_errors_are_flagged() {
        assert!(TutorError::embedding("down").is_external());
        assert!(TutorError::completion("down").is_external());
        assert!(!TutorError::IndexNotReady.is_external());
        assert!(!TutorError::InvalidRole("moderator".into()).is_external());
    }

    #[test]
    fn index_not_ready_maps_to_service_unavailable() {
        let response = TutorError::IndexNotReady.into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn caller_errors_map_to_bad_request() {
        let response = TutorError::invalid_parameter("k must be positive").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn external_errors_map_to_service_unavailable_and_data_errors_to_500() {
        let response = TutorError::embedding("timed out").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = TutorError::DimensionMismatch {
            expected: 3,
            actual: 2,
            position: 1,
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
