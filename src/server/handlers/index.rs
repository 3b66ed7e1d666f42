use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::core::errors::TutorError;
use crate::rag::DocumentFailure;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct RebuildResponse {
    pub documents: usize,
    pub chunks: usize,
    pub dimension: usize,
    pub failures: Vec<DocumentFailure>,
}

pub async fn rebuild_index(State(state): State<Arc<AppState>>) -> Result<Json<RebuildResponse>, TutorError> {
    let report = state.index_corpus().await?;
    Ok(Json(RebuildResponse {
        documents: report.documents,
        chunks: report.chunks,
        dimension: report.index.dimension(),
        failures: report.failures,
    }))
}
