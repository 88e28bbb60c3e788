use crate::artifacts::{ArtifactStore, Matrix};
use crate::models::Algorithm;

/// Produces one score per catalog item for a user row, dispatched on the
/// requested method. Already-rated items always come back as exactly 0.0,
/// whichever branch runs.
pub fn predict(store: &ArtifactStore, algorithm: Algorithm, user_row: usize) -> Vec<f32> {
    let ratings = store.rating_row(user_row);
    match algorithm {
        Algorithm::Svd => mask_rated(store.svd_row(user_row), ratings),
        Algorithm::Als => mask_rated(store.als_row(user_row), ratings),
        Algorithm::Cosine => similarity_scores(store.similarity(), ratings),
    }
}

/// Copies a precomputed score row, zeroing every item the user has rated.
fn mask_rated(scores: &[f32], ratings: &[Option<f32>]) -> Vec<f32> {
    scores
        .iter()
        .zip(ratings)
        .map(|(&score, rating)| if rating.is_some() { 0.0 } else { score })
        .collect()
}

/// Scores every item as the rating-weighted mean of its similarity to the
/// items the user has rated:
///
///   score[i] = sum_j(sim[i][j] * rating[j]) / sum_j(|sim[i][j]|)
///
/// summed over the user's rated items j. An item with no similarity weight
/// to any rated item scores exactly 0.0 rather than dividing by zero, as
/// does every item the user has already rated.
pub fn similarity_scores(similarity: &Matrix<f32>, ratings: &[Option<f32>]) -> Vec<f32> {
    let rated: Vec<(usize, f32)> = ratings
        .iter()
        .enumerate()
        .filter_map(|(item, rating)| rating.map(|value| (item, value)))
        .collect();

    let mut scores = vec![0.0; ratings.len()];
    for (item, slot) in scores.iter_mut().enumerate() {
        if ratings[item].is_some() {
            continue;
        }
        let row = similarity.row(item);
        let mut weighted = 0.0f32;
        let mut weight = 0.0f32;
        for &(rated_item, rating) in &rated {
            let sim = row[rated_item];
            weighted += sim * rating;
            weight += sim.abs();
        }
        if weight > 0.0 {
            *slot = weighted / weight;
        }
    }
    scores
}
