//! API error types for kashif-ir

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Conflict (409) - e.g., step gate closed or model not ready
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Upstream model failure (502)
    #[error("Upstream model error: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// kashif-common error
    #[error("{0}")]
    Common(#[from] kashif_common::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg),
            ApiError::Upstream(msg) => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR", msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg),
            ApiError::Common(err) => return common_error_response(err),
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}

/// Map the shared error taxonomy onto HTTP statuses
fn common_error_response(err: kashif_common::Error) -> Response {
    use kashif_common::Error;

    let (status, error_code) = match &err {
        Error::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
        Error::StepGateFailed { .. } => (StatusCode::CONFLICT, "STEP_GATE_FAILED"),
        Error::NotReady => (StatusCode::CONFLICT, "MODEL_NOT_READY"),
        Error::AnalysisIncomplete => (StatusCode::CONFLICT, "ANALYSIS_INCOMPLETE"),
        Error::ModelLoadFailure(_) => (StatusCode::BAD_GATEWAY, "MODEL_LOAD_FAILURE"),
        Error::InferenceFailure(_) => (StatusCode::BAD_GATEWAY, "INFERENCE_FAILURE"),
        Error::Database(_) | Error::Io(_) | Error::Config(_) | Error::Internal(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        }
    };

    let body = Json(json!({
        "error": {
            "code": error_code,
            "message": err.to_string(),
        }
    }));

    (status, body).into_response()
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
