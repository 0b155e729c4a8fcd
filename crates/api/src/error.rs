//! API error responses

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use inference_engine::InferenceError;
use serde::Serialize;
use thiserror::Error;

/// Errors surfaced to HTTP clients
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid request body: {}", .0.body_text())]
    Body(#[from] JsonRejection),
}

/// JSON error body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: &'static str,
}

impl ApiError {
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Inference(e) => e.kind(),
            ApiError::InvalidInput(_) | ApiError::Body(_) => "invalid_input",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Inference(e) if e.is_input_error() => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Body(rejection) => rejection.status(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
            kind: self.kind(),
        };
        (self.status(), Json(body)).into_response()
    }
}
