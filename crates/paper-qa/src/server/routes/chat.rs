//! Chat endpoint

use axum::{extract::State, Json};
use std::time::Instant;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{ChatRequest, ChatResponse};

/// POST /chat - Answer a question over the loaded papers
pub async fn chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatResponse>> {
    let question = request.text.trim();
    if question.is_empty() {
        return Err(Error::Validation("Question must not be empty".into()));
    }

    let start = Instant::now();
    tracing::info!("Question: \"{}\"", question);

    let response = state.registry().answer(question).await?;

    tracing::info!(
        "Answered in {}ms ({} chars)",
        start.elapsed().as_millis(),
        response.len()
    );

    Ok(Json(ChatResponse {
        response,
        papers: state.registry().papers(),
    }))
}
