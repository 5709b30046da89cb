//! kashif-ir library interface
//!
//! Exposes the incident-reporting flow (model gateway, classification
//! pipeline, analysis timeline, submission wizard, report store) and the
//! HTTP router for integration testing.

pub mod analysis;
pub mod api;
pub mod classify;
pub mod db;
pub mod error;
pub mod model;
pub mod taxonomy;
pub mod wizard;

pub use crate::error::{ApiError, ApiResult};

use crate::classify::ClassificationPipeline;
use crate::db::reports::ReportStore;
use crate::model::ModelGateway;
use crate::wizard::Wizard;
use axum::Router;
use chrono::{DateTime, Utc};
use kashif_common::events::EventBus;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Model acquisition gateway
    pub gateway: Arc<ModelGateway>,
    /// Image classification pipeline
    pub pipeline: Arc<ClassificationPipeline>,
    /// Submission flow controller
    pub wizard: Arc<Wizard>,
    /// Append-only report store
    pub store: ReportStore,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(
        event_bus: EventBus,
        gateway: Arc<ModelGateway>,
        pipeline: Arc<ClassificationPipeline>,
        wizard: Arc<Wizard>,
        store: ReportStore,
    ) -> Self {
        Self {
            event_bus,
            gateway,
            pipeline,
            wizard,
            store,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;
    use tower_http::cors::CorsLayer;

    Router::new()
        .merge(api::health_routes())
        .merge(api::model_routes())
        .merge(api::classify_routes())
        .merge(api::wizard_routes())
        .merge(api::report_routes())
        .route("/events", get(api::event_stream))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
