//! Churn Scoring API Server
//!
//! HTTP JSON boundary between the inference pipeline and a dashboard.

use anyhow::{Context, Result};
use axum::{
    routing::{get, post},
    Router,
};
use data_validator::Validator;
use inference_engine::InferenceEngine;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_governor::GovernorLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

pub mod config;
pub mod error;
pub mod rate_limit;
mod routes;

pub use crate::config::{AppConfig, LoggingConfig};
pub use crate::error::ApiError;
pub use crate::rate_limit::RateLimitConfig;

/// Application state shared across handlers. Read-only after startup.
pub struct AppState {
    /// Loaded bundle and thresholds
    pub engine: InferenceEngine,
    /// Nominal domain checks on incoming records
    pub validator: Validator,
    /// Prometheus handle, absent when no recorder is installed
    pub metrics: Option<PrometheusHandle>,
    /// Version string
    pub version: String,
    /// Start time
    pub start_time: std::time::Instant,
}

impl AppState {
    /// Create new application state
    pub fn new(engine: InferenceEngine, metrics: Option<PrometheusHandle>) -> Self {
        Self {
            engine,
            validator: Validator::default(),
            metrics,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
        }
    }
}

/// Create the application router. Scoring routes are rate limited when a config is given.
pub fn create_router(state: Arc<AppState>, rate_limit: Option<&RateLimitConfig>) -> Result<Router> {
    let mut scoring = Router::new()
        .route("/api/v1/predict", post(routes::predict::predict))
        .route("/api/v1/classify", post(routes::predict::classify));

    if let Some(config) = rate_limit {
        scoring = scoring.layer(GovernorLayer {
            config: crate::rate_limit::create_governor_config(config)?,
        });
    }

    Ok(Router::new()
        .route("/api/v1/health", get(routes::model::health))
        .route("/api/v1/model", get(routes::model::model_info))
        .route("/metrics", get(routes::model::metrics))
        .merge(scoring)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Initialize logging. `RUST_LOG` overrides the configured level.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .with_context(|| format!("Invalid log level {:?}", config.level))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match config.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.pretty().try_init(),
    };
    installed.map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {e}"))
}

/// Load the bundle, install metrics and serve until the process stops
pub async fn run_server(config: AppConfig) -> Result<()> {
    let engine = InferenceEngine::load(&config.model.bundle_path, config.risk)
        .with_context(|| format!("Failed to load model bundle {}", config.model.bundle_path))?;

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;

    let state = Arc::new(AppState::new(engine, Some(metrics)));
    let rate_limit = config
        .server
        .rate_limit_enabled
        .then_some(&config.rate_limit);
    let app = create_router(state, rate_limit)?;

    info!("Starting API server on {}", config.server.addr);

    let listener = tokio::net::TcpListener::bind(&config.server.addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.addr))?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
