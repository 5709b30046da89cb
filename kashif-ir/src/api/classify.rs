//! Classification endpoint

use crate::classify::ClassificationOutcome;
use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{extract::State, Json};
use base64::Engine;
use serde::Deserialize;

/// POST /classify request body
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    /// Base64-encoded evidence image
    pub image: String,
}

/// POST /classify - score an evidence image
///
/// Marks the image as the current one (stale in-flight inferences are
/// discarded when they resolve) and attaches the resulting decision to the
/// wizard draft.
pub async fn classify(
    State(state): State<AppState>,
    Json(request): Json<ClassifyRequest>,
) -> ApiResult<Json<ClassificationOutcome>> {
    let image = base64::engine::general_purpose::STANDARD
        .decode(request.image.trim())
        .map_err(|e| ApiError::BadRequest(format!("image is not valid base64: {}", e)))?;
    if image.is_empty() {
        return Err(ApiError::BadRequest("image payload is empty".to_string()));
    }

    let token = state.pipeline.begin_image();
    match state.pipeline.classify(token, &image).await? {
        Some(outcome) => {
            state.wizard.attach_decision(outcome.decision.clone()).await;
            Ok(Json(outcome))
        }
        None => Err(ApiError::Conflict(
            "classification superseded by a newer image".to_string(),
        )),
    }
}
