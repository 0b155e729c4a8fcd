//! Churn Scoring Service - Main Entry Point

use anyhow::Result;
use api::{config::DEFAULT_CONFIG_PATH, init_logging, run_server, AppConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = AppConfig::load_from_path(&config_path)?;

    init_logging(&config.logging)?;

    info!("=== Churn Scoring Service v{} ===", env!("CARGO_PKG_VERSION"));
    info!(
        config = %config_path,
        bundle = %config.model.bundle_path,
        high = config.risk.high,
        medium = config.risk.medium,
        "Configuration loaded"
    );

    run_server(config).await
}
