use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

pub async fn get_status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let engine = &state.engine;
    let provider = engine.completion_provider();
    let provider_healthy = match provider.health_check().await {
        Ok(healthy) => healthy,
        Err(err) => {
            tracing::warn!("Health check for {} failed: {}", provider.name(), err);
            false
        }
    };

    Json(json!({
        "state": engine.state(),
        "retrieval_enabled": engine.retrieval_enabled(),
        "index_chunks": engine.index_size().await,
        "turns": engine.turn_count().await,
        "model": engine.settings().llm.model,
        "provider": provider.name(),
        "provider_healthy": provider_healthy,
    }))
}
