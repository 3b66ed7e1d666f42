use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::errors::TutorError;
use crate::engine::Grounding;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct AskResponse {
    pub response: String,
    pub grounding: Grounding,
}

pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<AskRequest>,
) -> Result<Json<AskResponse>, TutorError> {
    if payload.query.trim().is_empty() {
        return Err(TutorError::invalid_parameter("query must not be empty"));
    }

    let answer = state.engine.ask(&payload.query).await?;
    Ok(Json(AskResponse {
        response: answer.text,
        grounding: answer.grounding,
    }))
}

pub async fn get_conversation(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.engine.conversation_snapshot().await)
}

pub async fn reset_conversation(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.engine.reset_conversation().await;
    Json(json!({
        "status": "reset",
        "turns": state.engine.turn_count().await,
    }))
}
