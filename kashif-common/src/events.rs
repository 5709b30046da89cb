//! Event types for the Kashif event system
//!
//! Provides shared event definitions and the EventBus used to fan out
//! lifecycle events (model, classification, wizard, analysis timeline) to
//! SSE clients and other subscribers.

use crate::types::{AnalysisFinding, ClassificationDecision, WizardStep};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Kashif event types
///
/// Events are broadcast via the EventBus and serialized for SSE
/// transmission. All events carry a timestamp.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum KashifEvent {
    /// Model acquisition started (network fetch in progress)
    ModelLoadStarted {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Model reached Ready; inference is now available
    ModelReady {
        label_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Model acquisition failed; user may retry
    ModelLoadFailed {
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// An evidence image was classified
    ClassificationCompleted {
        decision: ClassificationDecision,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A stale inference result was discarded (a newer image superseded it)
    ClassificationDiscarded {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Wizard moved to a different step
    StepChanged {
        old_step: WizardStep,
        new_step: WizardStep,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Analysis timeline started emitting findings
    AnalysisStarted {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// One finding revealed, strictly in sequence order
    FindingRevealed {
        finding: AnalysisFinding,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// All findings revealed; submission gate is open
    AnalysisCompleted {
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Report constructed and appended to the store
    ReportSubmitted {
        report_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Whole flow reset: fresh draft, first step, idle timeline
    WizardReset {
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl KashifEvent {
    /// Event type name for SSE `event:` fields
    pub fn event_type(&self) -> &'static str {
        match self {
            KashifEvent::ModelLoadStarted { .. } => "ModelLoadStarted",
            KashifEvent::ModelReady { .. } => "ModelReady",
            KashifEvent::ModelLoadFailed { .. } => "ModelLoadFailed",
            KashifEvent::ClassificationCompleted { .. } => "ClassificationCompleted",
            KashifEvent::ClassificationDiscarded { .. } => "ClassificationDiscarded",
            KashifEvent::StepChanged { .. } => "StepChanged",
            KashifEvent::AnalysisStarted { .. } => "AnalysisStarted",
            KashifEvent::FindingRevealed { .. } => "FindingRevealed",
            KashifEvent::AnalysisCompleted { .. } => "AnalysisCompleted",
            KashifEvent::ReportSubmitted { .. } => "ReportSubmitted",
            KashifEvent::WizardReset { .. } => "WizardReset",
        }
    }
}

/// Central event distribution bus
///
/// Uses tokio::broadcast internally:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<KashifEvent>,
}

impl EventBus {
    /// Create a new EventBus with the given channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<KashifEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Send errors are ignored: no receivers is a normal condition.
    pub fn emit(&self, event: KashifEvent) {
        let _ = self.tx.send(event);
    }
}
