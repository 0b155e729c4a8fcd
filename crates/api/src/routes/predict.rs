//! Scoring routes

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use feature_engine::CustomerRecord;
use retention::{classify_with, RiskAssessment};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::ApiError;
use crate::AppState;

/// Body for `/api/v1/classify`
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub probability: f64,
}

/// Score a customer and return tier plus retention actions
pub async fn predict(
    State(state): State<Arc<AppState>>,
    body: Result<Json<CustomerRecord>, JsonRejection>,
) -> Result<Json<RiskAssessment>, ApiError> {
    let Json(record) = body.map_err(|e| {
        metrics::counter!("churn_prediction_errors_total", "kind" => "invalid_input").increment(1);
        ApiError::from(e)
    })?;
    let validation = state.validator.validate(&record);
    if !validation.valid {
        let closed: Vec<String> = validation
            .closed_domain_errors()
            .map(|e| e.to_string())
            .collect();
        if !closed.is_empty() {
            metrics::counter!("churn_prediction_errors_total", "kind" => "invalid_input")
                .increment(1);
            return Err(ApiError::InvalidInput(closed.join("; ")));
        }
        for error in &validation.errors {
            warn!(error = %error, "Scoring record outside nominal domain");
        }
    }

    let assessment = state.engine.assess(&record).map_err(|e| {
        metrics::counter!("churn_prediction_errors_total", "kind" => e.kind()).increment(1);
        warn!(error = %e, kind = e.kind(), "Prediction failed");
        ApiError::from(e)
    })?;

    metrics::counter!("churn_predictions_total", "tier" => assessment.tier.as_str()).increment(1);
    metrics::histogram!("churn_probability").record(assessment.probability);
    info!(
        probability = assessment.probability,
        tier = %assessment.tier,
        "Prediction served"
    );

    Ok(Json(assessment))
}

/// Map a probability straight to a tier
pub async fn classify(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ClassifyRequest>, JsonRejection>,
) -> Result<Json<RiskAssessment>, ApiError> {
    let Json(request) = body?;
    Ok(Json(classify_with(request.probability, state.engine.thresholds())))
}
