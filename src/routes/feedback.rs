use axum::{extract::State, http::StatusCode, Json};
use serde::Deserialize;

use crate::error::AppResult;

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedbackRequest {
    pub user: String,
    pub message: String,
}

/// Handler for free-text feedback submissions
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<FeedbackRequest>,
) -> AppResult<StatusCode> {
    state
        .feedback_log
        .append(&request.user, &request.message)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
