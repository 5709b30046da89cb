//! Submission wizard state machine
//!
//! Sequences the fixed step list (locate → evidence → details → review),
//! applies per-step gates, triggers the analysis timeline from the review
//! step, and on timeline completion constructs a Report and appends it to
//! the report store.
//!
//! One wizard instance owns its draft and its timeline; there is no shared
//! mutable singleton state. Navigation is strictly adjacent.

use crate::analysis::{AnalysisState, AnalysisTimeline};
use crate::db::reports::ReportStore;
use kashif_common::events::{EventBus, KashifEvent};
use kashif_common::types::{
    ClassificationDecision, Report, ReportDraft, ReportStatus, WizardStep,
};
use kashif_common::{Error, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use uuid::Uuid;
use tracing::{debug, info};

/// Outcome of a submit() call
///
/// Submission before timeline completion is a no-op, never a hard error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// Timeline completed; the report was appended to the store
    Submitted { report: Report },
    /// A submission is already driving the timeline; this call did nothing
    AnalysisRunning,
    /// The wizard was reset while the timeline was running; nothing stored
    Cancelled,
}

/// Read-only snapshot for the presentation boundary
///
/// Never a handle into internal mutable state.
#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    pub step: WizardStep,
    pub step_index: usize,
    pub step_count: usize,
    /// Whether the current step's gate predicate holds for the draft
    pub can_advance: bool,
    pub draft: ReportDraft,
    pub decision: Option<ClassificationDecision>,
    pub analysis_state: AnalysisState,
    pub revealed_findings: Vec<kashif_common::types::AnalysisFinding>,
    pub last_report_id: Option<Uuid>,
}

/// Partial draft update from the presentation boundary
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftPatch {
    pub vehicle_image_ref: Option<String>,
    pub road_image_ref: Option<String>,
    pub description: Option<String>,
    pub location_text: Option<String>,
    pub occurred_at: Option<chrono::DateTime<chrono::Utc>>,
}

struct WizardState {
    step: WizardStep,
    draft: ReportDraft,
    decision: Option<ClassificationDecision>,
    /// True while a submit() call is driving the timeline
    submitting: bool,
    last_report: Option<Report>,
    /// Bumped by reset(); a submit holding a stale epoch must not finalize
    flow_epoch: u64,
}

impl WizardState {
    fn fresh(flow_epoch: u64) -> Self {
        Self {
            step: WizardStep::first(),
            draft: ReportDraft::new(),
            decision: None,
            submitting: false,
            last_report: None,
            flow_epoch,
        }
    }
}

/// Top-level submission flow controller
pub struct Wizard {
    state: RwLock<WizardState>,
    timeline: AnalysisTimeline,
    store: ReportStore,
    events: EventBus,
}

impl Wizard {
    pub fn new(timeline: AnalysisTimeline, store: ReportStore, events: EventBus) -> Self {
        Self {
            state: RwLock::new(WizardState::fresh(0)),
            timeline,
            store,
            events,
        }
    }

    /// Current step
    pub async fn current_step(&self) -> WizardStep {
        self.state.read().await.step
    }

    /// Read-only snapshot for rendering
    pub async fn snapshot(&self) -> WizardSnapshot {
        let state = self.state.read().await;
        WizardSnapshot {
            step: state.step,
            step_index: state.step.index(),
            step_count: WizardStep::ALL.len(),
            can_advance: state.step.can_advance(&state.draft),
            draft: state.draft.clone(),
            decision: state.decision.clone(),
            analysis_state: self.timeline.state(),
            revealed_findings: self.timeline.revealed(),
            last_report_id: state.last_report.as_ref().map(|r| r.id),
        }
    }

    /// Apply a partial draft update
    pub async fn update_draft(&self, patch: DraftPatch) -> ReportDraft {
        let mut state = self.state.write().await;
        if let Some(v) = patch.vehicle_image_ref {
            state.draft.vehicle_image_ref = Some(v);
        }
        if let Some(r) = patch.road_image_ref {
            state.draft.road_image_ref = Some(r);
            // A fresh road image invalidates any decision made for the old one
            state.decision = None;
        }
        if let Some(d) = patch.description {
            state.draft.description = d;
        }
        if let Some(l) = patch.location_text {
            state.draft.location_text = l;
        }
        if let Some(t) = patch.occurred_at {
            state.draft.occurred_at = t;
        }
        state.draft.clone()
    }

    /// Attach the classification decision for the current evidence image
    pub async fn attach_decision(&self, decision: ClassificationDecision) {
        self.state.write().await.decision = Some(decision);
    }

    /// Advance to the next step
    ///
    /// Fails with `StepGateFailed` when the current step's gate predicate
    /// is false or the wizard is already at the terminal review step.
    pub async fn advance(&self) -> Result<WizardStep> {
        let mut state = self.state.write().await;
        let step = state.step;

        let next = step.next().ok_or(Error::StepGateFailed {
            step,
            reason: "already at the final step",
        })?;

        if !step.can_advance(&state.draft) {
            debug!(?step, "Advance refused: {}", step.gate_requirement());
            return Err(Error::StepGateFailed {
                step,
                reason: step.gate_requirement(),
            });
        }

        state.step = next;
        self.events.emit(KashifEvent::StepChanged {
            old_step: step,
            new_step: next,
            timestamp: chrono::Utc::now(),
        });
        Ok(next)
    }

    /// Step back one step
    ///
    /// Always succeeds; a no-op at the first step.
    pub async fn retreat(&self) -> WizardStep {
        let mut state = self.state.write().await;
        if let Some(prev) = state.step.prev() {
            let old = state.step;
            state.step = prev;
            self.events.emit(KashifEvent::StepChanged {
                old_step: old,
                new_step: prev,
                timestamp: chrono::Utc::now(),
            });
        }
        state.step
    }

    /// Submit the report from the review step
    ///
    /// Starts the analysis timeline and finalizes only once it completes:
    /// the draft is snapshotted into a Report (decision attached when an
    /// evidence image was classified) and appended to the store. Re-entrant
    /// calls while the timeline runs are idempotent no-ops; a repeat call
    /// after success returns the already-stored report.
    pub async fn submit(&self) -> Result<SubmitOutcome> {
        let epoch;
        {
            let mut state = self.state.write().await;
            if state.step != WizardStep::Review {
                return Err(Error::StepGateFailed {
                    step: state.step,
                    reason: "submission is only available from the review step",
                });
            }
            if let Some(report) = &state.last_report {
                return Ok(SubmitOutcome::Submitted {
                    report: report.clone(),
                });
            }
            if state.submitting || self.timeline.state() == AnalysisState::Running {
                return Ok(SubmitOutcome::AnalysisRunning);
            }
            state.submitting = true;
            epoch = state.flow_epoch;
            // Started under the state lock so a concurrent reset() cannot
            // slip between the gate check and the timeline start.
            self.timeline.start();
        }

        let outcome = self.await_timeline_outcome().await;

        let mut state = self.state.write().await;
        // reset() bumps the epoch. The state channel coalesces, so a waiter
        // can miss the Idle from its own reset and wake on a later flow's
        // completion; the epoch comparison catches that case too.
        if outcome.is_err() || state.flow_epoch != epoch {
            info!("Submission cancelled: wizard was reset while analysis ran");
            return Ok(SubmitOutcome::Cancelled);
        }
        state.submitting = false;

        let report = Report {
            id: Uuid::new_v4(),
            draft: state.draft.clone(),
            decision: state.decision.clone(),
            status: ReportStatus::Created,
            submitted_at: chrono::Utc::now(),
        };
        self.store.append(&report).await?;
        state.last_report = Some(report.clone());

        info!(report_id = %report.id, "Report submitted");
        self.events.emit(KashifEvent::ReportSubmitted {
            report_id: report.id,
            timestamp: chrono::Utc::now(),
        });

        Ok(SubmitOutcome::Submitted { report })
    }

    /// Wait for the running timeline to complete or be reset
    ///
    /// `AnalysisIncomplete` when a reset dropped the run back to `Idle`
    /// before completion; the caller treats it as a no-op, not a failure.
    async fn await_timeline_outcome(&self) -> Result<()> {
        let mut rx = self.timeline.subscribe();
        loop {
            match *rx.borrow_and_update() {
                AnalysisState::Completed => return Ok(()),
                AnalysisState::Idle => return Err(Error::AnalysisIncomplete),
                AnalysisState::Running => {}
            }
            if rx.changed().await.is_err() {
                return Err(Error::AnalysisIncomplete);
            }
        }
    }

    /// Discard the whole flow and start a new report
    ///
    /// Returns to the first step with a fresh draft and an idle timeline;
    /// a running timeline stops emitting and its completion is discarded.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        self.timeline.reset();
        *state = WizardState::fresh(state.flow_epoch.wrapping_add(1));
        self.events.emit(KashifEvent::WizardReset {
            timestamp: chrono::Utc::now(),
        });
    }
}
