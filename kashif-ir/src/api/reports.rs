//! Report listing endpoints

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use axum::{
    extract::{Path, State},
    Json,
};
use kashif_common::types::Report;
use uuid::Uuid;

/// GET /reports - all submitted reports, oldest first
pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Report>>> {
    Ok(Json(state.store.list_all().await?))
}

/// GET /reports/:id - a single report
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Report>> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::BadRequest(format!("invalid report id: {}", id)))?;
    Ok(Json(state.store.get(id).await?))
}
