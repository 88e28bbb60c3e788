use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Scoring method used to produce a slate of recommendations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    /// Singular value decomposition, scored offline into a prediction table
    Svd,
    /// Weighted alternating least squares, scored offline into a prediction table
    Als,
    /// Item-item cosine similarity, scored live from the user's own ratings
    #[serde(rename = "cos")]
    Cosine,
}

impl Algorithm {
    /// The order in which methods are offered to a user who never asks
    /// for one explicitly.
    pub const ROTATION: [Algorithm; 3] = [Algorithm::Svd, Algorithm::Als, Algorithm::Cosine];

    /// Short tag used on the wire and in the usage log
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Svd => "svd",
            Algorithm::Als => "als",
            Algorithm::Cosine => "cos",
        }
    }

    /// Parses a short tag, case-insensitively
    pub fn parse(tag: &str) -> Option<Algorithm> {
        match tag.to_lowercase().as_str() {
            "svd" => Some(Algorithm::Svd),
            "als" => Some(Algorithm::Als),
            "cos" => Some(Algorithm::Cosine),
            _ => None,
        }
    }

    /// Human-readable name shown to the user alongside results
    pub fn display_name(&self) -> &'static str {
        match self {
            Algorithm::Svd => "Singular Value Decomposition",
            Algorithm::Als => {
                "Non-Negative Matrix Factorization with Weighted Alternating Least Squares"
            }
            Algorithm::Cosine => "Cosine Similarity",
        }
    }

    /// Whether this method is the last stop in the rotation
    pub fn is_last_in_rotation(&self) -> bool {
        *self == Self::ROTATION[Self::ROTATION.len() - 1]
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How the user judged a slate of recommendations
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Outcome {
    #[serde(rename = "good")]
    Positive,
    #[serde(rename = "not_good")]
    Negative,
}

impl Outcome {
    /// Single-character form persisted in the usage log
    pub fn as_bit(&self) -> &'static str {
        match self {
            Outcome::Positive => "1",
            Outcome::Negative => "0",
        }
    }

    /// Parses the persisted single-character form
    pub fn from_bit(bit: &str) -> Option<Outcome> {
        match bit {
            "1" => Some(Outcome::Positive),
            "0" => Some(Outcome::Negative),
            _ => None,
        }
    }
}

/// One committed line of the usage log: a user saw a method and judged it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageEntry {
    pub user: String,
    pub algorithm: Algorithm,
    pub outcome: Outcome,
}

/// A rankable item from the catalog
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogItem {
    /// Identifier matching the rating and similarity tables
    pub id: String,
    pub title: String,
    /// Externally published popularity rank
    pub rank: u32,
}

/// A single recommendation returned to the client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub title: String,
    pub rank: u32,
}
