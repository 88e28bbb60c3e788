use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::{AppError, AppResult},
    models::{Algorithm, Recommendation},
    services::recommender::RecommendOutcome,
};

use super::AppState;

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub user: String,
    /// Short method tag; omitted means follow the rotation
    #[serde(default)]
    pub algorithm: Option<String>,
    /// Slate size; omitted means the configured default
    #[serde(default)]
    pub top_n: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RecommendationResponse {
    /// A ranked slate was produced
    Ready {
        user: String,
        algorithm: Algorithm,
        algorithm_name: &'static str,
        /// True when the client should stop prompting for a judgement
        is_final: bool,
        recommendations: Vec<Recommendation>,
    },
    /// The user has judged every method
    Exhausted { user: String },
}

/// Handler for the recommendations endpoint
pub async fn recommend(
    State(state): State<AppState>,
    Json(request): Json<RecommendationRequest>,
) -> AppResult<Json<RecommendationResponse>> {
    let override_method = match request.algorithm.as_deref() {
        Some(tag) => Some(
            Algorithm::parse(tag)
                .ok_or_else(|| AppError::InvalidInput(format!("unknown algorithm tag {tag:?}")))?,
        ),
        None => None,
    };
    let top_n = request.top_n.unwrap_or(state.default_top_n);

    let response = match state
        .recommender
        .recommend(&request.user, override_method, top_n)
        .await?
    {
        RecommendOutcome::Ranked(slate) => RecommendationResponse::Ready {
            user: request.user,
            algorithm: slate.algorithm,
            algorithm_name: slate.algorithm.display_name(),
            is_final: slate.is_final,
            recommendations: slate.items,
        },
        RecommendOutcome::Exhausted => RecommendationResponse::Exhausted { user: request.user },
    };
    Ok(Json(response))
}
