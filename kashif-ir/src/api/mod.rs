//! HTTP API for kashif-ir
//!
//! Thin handlers over the wizard, the classification pipeline, and the
//! report store; lifecycle events stream over SSE at `/events`.

mod classify;
mod health;
mod model;
mod reports;
mod sse;
mod wizard;

pub use sse::event_stream;

use crate::AppState;
use axum::routing::{get, post, put};
use axum::Router;

/// Health check routes
pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health::health))
}

/// Model gateway routes
pub fn model_routes() -> Router<AppState> {
    Router::new()
        .route("/model/load", post(model::load))
        .route("/model/status", get(model::status))
}

/// Classification routes
pub fn classify_routes() -> Router<AppState> {
    Router::new().route("/classify", post(classify::classify))
}

/// Wizard routes
pub fn wizard_routes() -> Router<AppState> {
    Router::new()
        .route("/wizard", get(wizard::snapshot))
        .route("/wizard/draft", put(wizard::update_draft))
        .route("/wizard/advance", post(wizard::advance))
        .route("/wizard/retreat", post(wizard::retreat))
        .route("/wizard/reset", post(wizard::reset))
        .route("/wizard/submit", post(wizard::submit))
}

/// Report listing routes
pub fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/reports", get(reports::list))
        .route("/reports/:id", get(reports::get))
}
