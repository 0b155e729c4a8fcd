//! Health and model information routes

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use retention::RiskThresholds;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::AppState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub feature_count: usize,
}

/// Loaded bundle description
#[derive(Debug, Serialize)]
pub struct ModelInfoResponse {
    pub version: Option<String>,
    pub metrics: BTreeMap<String, f64>,
    pub feature_names: Vec<String>,
    pub geography_classes: Vec<String>,
    pub age_bin_edges: Vec<f64>,
    pub thresholds: RiskThresholds,
}

/// Health check handler
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        feature_count: state.engine.bundle().feature_count(),
    })
}

/// Bundle metadata, feature order and tier thresholds
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<ModelInfoResponse> {
    let bundle = state.engine.bundle();
    let metadata = bundle.metadata();
    let engineer = bundle.engineer();

    Json(ModelInfoResponse {
        version: metadata.version.clone(),
        metrics: metadata.metrics.clone(),
        feature_names: bundle.feature_names().to_vec(),
        geography_classes: engineer.geography_encoder().classes().to_vec(),
        age_bin_edges: engineer.age_bins().edges().to_vec(),
        thresholds: *state.engine.thresholds(),
    })
}

/// Prometheus exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}
