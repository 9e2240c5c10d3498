//! Feedback endpoints

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{FeedbackRequest, FeedbackStats, MessageResponse};

/// POST /feedback - Record a like/dislike for an answer
pub async fn submit_feedback(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> Result<Json<MessageResponse>> {
    state
        .feedback()
        .save_feedback(&request.question, &request.answer, &request.feedback_type)
        .await?;

    tracing::info!("Feedback recorded: {}", request.feedback_type);
    Ok(Json(MessageResponse::new("Feedback saved successfully")))
}

/// GET /feedback/stats - Like/dislike counts
pub async fn feedback_stats(State(state): State<AppState>) -> Result<Json<FeedbackStats>> {
    Ok(Json(state.feedback().stats().await?))
}
