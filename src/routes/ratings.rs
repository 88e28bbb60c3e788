use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{Algorithm, Outcome},
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RatingRequest {
    pub user: String,
    /// Short tag of the method being judged
    pub algorithm: String,
    /// "good" or "not_good"
    pub outcome: Outcome,
}

#[derive(Debug, Serialize)]
pub struct RatingResponse {
    /// True when the judged method was the last one the rotation offers
    pub tour_complete: bool,
}

/// Handler for judging a slate of recommendations
pub async fn submit(
    State(state): State<AppState>,
    Json(request): Json<RatingRequest>,
) -> AppResult<Json<RatingResponse>> {
    let algorithm = Algorithm::parse(&request.algorithm).ok_or_else(|| {
        AppError::InvalidInput(format!("unknown algorithm tag {:?}", request.algorithm))
    })?;

    let tour_complete = state
        .recommender
        .record_rating(&request.user, algorithm, request.outcome)
        .await?;
    Ok(Json(RatingResponse { tour_complete }))
}
