//! Model gateway endpoints

use crate::error::ApiResult;
use crate::model::GatewayPhase;
use crate::AppState;
use axum::{extract::State, Json};

/// POST /model/load - acquire the model (or retry after a failure)
///
/// Concurrent calls share the in-flight acquisition.
pub async fn load(State(state): State<AppState>) -> ApiResult<Json<GatewayPhase>> {
    state.gateway.load().await?;
    Ok(Json(state.gateway.phase()))
}

/// GET /model/status - current gateway phase
pub async fn status(State(state): State<AppState>) -> Json<GatewayPhase> {
    Json(state.gateway.phase())
}
