//! Wizard endpoints

use crate::error::ApiResult;
use crate::wizard::{DraftPatch, SubmitOutcome, WizardSnapshot};
use crate::AppState;
use axum::{extract::State, Json};
use kashif_common::types::{ReportDraft, WizardStep};
use serde_json::{json, Value};

/// GET /wizard - snapshot of the current flow
pub async fn snapshot(State(state): State<AppState>) -> Json<WizardSnapshot> {
    Json(state.wizard.snapshot().await)
}

/// PUT /wizard/draft - apply a partial draft update
///
/// Setting a new road image also marks it as the current classification
/// target, so stale in-flight inferences get discarded.
pub async fn update_draft(
    State(state): State<AppState>,
    Json(patch): Json<DraftPatch>,
) -> Json<ReportDraft> {
    if patch.road_image_ref.is_some() {
        state.pipeline.begin_image();
    }
    Json(state.wizard.update_draft(patch).await)
}

/// POST /wizard/advance - move to the next step (gated)
pub async fn advance(State(state): State<AppState>) -> ApiResult<Json<Value>> {
    let step = state.wizard.advance().await?;
    Ok(Json(step_body(step)))
}

/// POST /wizard/retreat - move back one step (no-op at the first)
pub async fn retreat(State(state): State<AppState>) -> Json<Value> {
    let step = state.wizard.retreat().await;
    Json(step_body(step))
}

/// POST /wizard/reset - discard the flow and start over
pub async fn reset(State(state): State<AppState>) -> Json<Value> {
    state.wizard.reset().await;
    Json(json!({ "status": "reset" }))
}

/// POST /wizard/submit - run the analysis timeline and finalize the report
///
/// Blocks until the timeline completes (or a reset discards the flow).
pub async fn submit(State(state): State<AppState>) -> ApiResult<Json<SubmitOutcome>> {
    let outcome = state.wizard.submit().await?;
    Ok(Json(outcome))
}

fn step_body(step: WizardStep) -> Value {
    json!({
        "step": step,
        "step_index": step.index(),
        "step_count": WizardStep::ALL.len(),
    })
}
