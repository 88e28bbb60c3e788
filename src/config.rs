use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Catalog CSV (item id, title, published rank)
    #[serde(default = "default_catalog_path")]
    pub catalog_path: String,

    /// Rating triples CSV (user id, item id, rating)
    #[serde(default = "default_ratings_path")]
    pub ratings_path: String,

    /// Precomputed SVD score table CSV, one row per user
    #[serde(default = "default_svd_predictions_path")]
    pub svd_predictions_path: String,

    /// Precomputed ALS score table CSV, one row per user
    #[serde(default = "default_als_predictions_path")]
    pub als_predictions_path: String,

    /// Item-item similarity matrix CSV, one row per item
    #[serde(default = "default_similarity_path")]
    pub similarity_path: String,

    /// Append-only usage log recording which method each user has rated
    #[serde(default = "default_usage_log_path")]
    pub usage_log_path: String,

    /// Append-only free-text feedback log
    #[serde(default = "default_feedback_log_path")]
    pub feedback_log_path: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Slate size when a request does not ask for one
    #[serde(default = "default_top_n")]
    pub default_top_n: usize,
}

fn default_catalog_path() -> String {
    "data/catalog.csv".to_string()
}

fn default_ratings_path() -> String {
    "data/ratings.csv".to_string()
}

fn default_svd_predictions_path() -> String {
    "data/svd_predictions.csv".to_string()
}

fn default_als_predictions_path() -> String {
    "data/als_predictions.csv".to_string()
}

fn default_similarity_path() -> String {
    "data/similarity.csv".to_string()
}

fn default_usage_log_path() -> String {
    "data/usage.log".to_string()
}

fn default_feedback_log_path() -> String {
    "data/feedback.log".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_top_n() -> usize {
    20
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }
}
