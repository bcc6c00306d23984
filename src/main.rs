use std::sync::Arc;

use tracing::info;

use behavior_scorecard::config::Config;
use behavior_scorecard::engine::ScoringEngine;
use behavior_scorecard::web::server::WebServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "behavior_scorecard=info".into()),
        )
        .init();

    info!("📊 behavior-scorecard v{} starting...", env!("CARGO_PKG_VERSION"));

    // Load config
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "behavior-scorecard.toml".to_string());

    let config = Config::load(&config_path)?;
    info!("Config loaded from {}", config_path);

    let config = Arc::new(config);

    // Initialize scoring engine (loads model artifacts; a configured but
    // missing model file aborts here, before any scoring)
    let engine = Arc::new(ScoringEngine::new(config.clone())?);

    // Run the dashboard
    let web = WebServer::new(engine, config);
    web.run().await
}
