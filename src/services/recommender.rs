use std::sync::Arc;

use crate::artifacts::ArtifactStore;
use crate::error::{AppError, AppResult};
use crate::models::{Algorithm, Outcome, Recommendation, UsageEntry};
use crate::services::rotation::{self, MethodChoice};
use crate::services::{ranking, scoring};
use crate::storage::usage_log::UsageLog;

/// A ranked slate plus how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedSlate {
    pub algorithm: Algorithm,
    /// True when the method was an explicit request; the client should stop
    /// prompting for a judgement.
    pub is_final: bool,
    pub items: Vec<Recommendation>,
}

/// Result of a recommendation request.
#[derive(Debug, Clone, PartialEq)]
pub enum RecommendOutcome {
    Ranked(RankedSlate),
    /// The user has judged every method and asked for nothing specific.
    Exhausted,
}

/// Ties method selection, scoring and ranking together over the shared
/// artifact store and usage log.
pub struct Recommender {
    artifacts: Arc<ArtifactStore>,
    usage_log: Arc<dyn UsageLog>,
}

impl Recommender {
    pub fn new(artifacts: Arc<ArtifactStore>, usage_log: Arc<dyn UsageLog>) -> Self {
        Self {
            artifacts,
            usage_log,
        }
    }

    /// Produces a slate for `user`, following the rotation unless
    /// `override_method` names a method explicitly.
    pub async fn recommend(
        &self,
        user: &str,
        override_method: Option<Algorithm>,
        top_n: usize,
    ) -> AppResult<RecommendOutcome> {
        let row = self
            .artifacts
            .user_row_index(user)
            .ok_or_else(|| AppError::UserNotFound(user.to_string()))?;
        let history = self.usage_log.entries_for(user).await?;

        match rotation::select(override_method, &history) {
            MethodChoice::Exhausted => {
                tracing::info!(user = %user, "Rotation exhausted");
                Ok(RecommendOutcome::Exhausted)
            }
            MethodChoice::Chosen {
                algorithm,
                is_final,
            } => {
                let scores = scoring::predict(&self.artifacts, algorithm, row);
                let items = ranking::rank(
                    &scores,
                    self.artifacts.rating_row(row),
                    self.artifacts.catalog(),
                    top_n,
                );
                tracing::info!(
                    user = %user,
                    algorithm = %algorithm,
                    is_final,
                    returned = items.len(),
                    "Recommendations ranked"
                );
                Ok(RecommendOutcome::Ranked(RankedSlate {
                    algorithm,
                    is_final,
                    items,
                }))
            }
        }
    }

    /// Records the user's judgement of a method. Returns true when the
    /// judged method closes the rotation, so the client knows the tour of
    /// methods is over.
    pub async fn record_rating(
        &self,
        user: &str,
        algorithm: Algorithm,
        outcome: Outcome,
    ) -> AppResult<bool> {
        if self.artifacts.user_row_index(user).is_none() {
            return Err(AppError::UserNotFound(user.to_string()));
        }
        self.usage_log
            .append(UsageEntry {
                user: user.to_string(),
                algorithm,
                outcome,
            })
            .await?;
        tracing::info!(user = %user, algorithm = %algorithm, "Judgement recorded");
        Ok(algorithm.is_last_in_rotation())
    }
}
