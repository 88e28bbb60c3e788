use crate::models::{CatalogItem, Recommendation};

/// Turns a score vector into the final slate. Already-rated items are
/// masked out of the candidate set here even though scoring already zeroes
/// them, so a raw score vector from any source still ranks safely. The rest
/// sort by descending score and the top `top_n` survivors project to title
/// plus published rank.
///
/// The sort is stable, so items with equal scores keep catalog order.
pub fn rank(
    scores: &[f32],
    ratings: &[Option<f32>],
    catalog: &[CatalogItem],
    top_n: usize,
) -> Vec<Recommendation> {
    let mut candidates: Vec<(usize, f32)> = scores
        .iter()
        .zip(ratings)
        .enumerate()
        .filter(|(_, (_, rating))| rating.is_none())
        .map(|(item, (&score, _))| (item, score))
        .collect();

    candidates.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(top_n);

    candidates
        .into_iter()
        .map(|(item, _)| Recommendation {
            title: catalog[item].title.clone(),
            rank: catalog[item].rank,
        })
        .collect()
}
