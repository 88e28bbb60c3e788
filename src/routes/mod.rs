use std::sync::Arc;

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::request_id::{request_id_middleware, trace_span_for};
use crate::services::recommender::Recommender;
use crate::storage::feedback::FeedbackLog;

pub mod feedback;
pub mod ratings;
pub mod recommendations;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub recommender: Arc<Recommender>,
    pub feedback_log: Arc<FeedbackLog>,
    pub default_top_n: usize,
}

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", api_routes())
        .layer(TraceLayer::new_for_http().make_span_with(trace_span_for))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// API routes under /api/v1
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/recommendations", post(recommendations::recommend))
        .route("/ratings", post(ratings::submit))
        .route("/feedback", post(feedback::submit))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
