//! HTTP request/response types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::core::PipelineError;

/// Body of `POST /speak`
#[derive(Debug, Deserialize)]
pub struct SpeakRequest {
    /// Text to speak
    pub text: String,
    /// Pre-registered voice profile id; default voice when absent
    #[serde(default)]
    pub voice_id: Option<String>,
}

/// Successful synthesis response
#[derive(Debug, Serialize)]
pub struct SpeakResponse {
    /// Publicly fetchable download URL
    pub url: String,
    /// Storage object id, for support requests
    pub object_id: String,
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Error body returned to callers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// HTTP-facing error wrapper
///
/// Validation failures are the caller's fault and map to 400 with their
/// exact message; everything downstream is a 500 whose stage detail
/// lives in the logs, not the body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        if err.is_client_error() {
            warn!(stage = %err.stage, error = %err, "request rejected");
            Self {
                status: StatusCode::BAD_REQUEST,
                message: err.public_message(),
            }
        } else {
            error!(stage = %err.stage, error = %err, "pipeline failed");
            Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: err.public_message(),
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}
