//! Health check endpoint

use crate::AppState;
use axum::{extract::State, Json};
use serde_json::{json, Value};

/// GET /health - service liveness and uptime
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let uptime = chrono::Utc::now() - state.startup_time;
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": uptime.num_seconds(),
    }))
}
