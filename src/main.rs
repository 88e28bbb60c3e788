use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use tabletop_rec::artifacts::ArtifactStore;
use tabletop_rec::config::Config;
use tabletop_rec::routes::{create_router, AppState};
use tabletop_rec::services::recommender::Recommender;
use tabletop_rec::storage::feedback::FeedbackLog;
use tabletop_rec::storage::usage_log::FileUsageLog;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("tabletop_rec=info,tower_http=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = Config::from_env()?;

    let artifacts = Arc::new(ArtifactStore::load(&config)?);
    let usage_log = Arc::new(FileUsageLog::open(&config.usage_log_path).await?);
    let feedback_log = Arc::new(FeedbackLog::open(&config.feedback_log_path).await?);
    let recommender = Arc::new(Recommender::new(artifacts, usage_log));

    let state = AppState {
        recommender,
        feedback_log,
        default_top_n: config.default_top_n,
    };
    let app = create_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Server listening");
    axum::serve(listener, app).await?;

    Ok(())
}
