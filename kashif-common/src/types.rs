//! Shared domain types for incident reporting
//!
//! These types cross module boundaries: the classification pipeline produces
//! decisions, the wizard accumulates a draft and emits reports, and the
//! analysis timeline reveals findings. Events reference them, so they live
//! here rather than in the service crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One model prediction for an evidence image
///
/// An image yields a full probability distribution over labels; a set of
/// predictions for one inference sums to 1.0 within floating tolerance.
/// Ranking is established by the classification pipeline, not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Opaque label key produced by the model (e.g. "Pothole")
    pub label: String,
    /// Probability in [0, 1]
    pub probability: f32,
}

/// Severity class attached to a taxonomy entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Significant damage requiring immediate action
    Severe,
    /// Damage present, repair recommended
    Moderate,
    /// No damage detected
    None,
    /// Label not covered by the taxonomy
    Unknown,
}

/// Static decision metadata for a classification label
///
/// Immutable for the process lifetime. Lookup misses resolve to a defined
/// fallback entry rather than failing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxonomyEntry {
    /// Raw classifier label this entry is keyed by
    pub label: String,
    /// Human-facing name
    pub display_name: String,
    /// Display icon (emoji)
    pub icon: String,
    /// Severity class
    pub severity: Severity,
    /// Party responsible for remediation
    pub responsible_party: String,
}

/// Decision derived from the top-ranked prediction plus its taxonomy entry
///
/// Created fresh per inference call, never mutated, discarded when a new
/// image is selected or the analysis is reset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationDecision {
    pub label: String,
    pub display_name: String,
    pub icon: String,
    pub severity: Severity,
    pub responsible_party: String,
    /// Probability of the top-ranked prediction
    pub confidence: f32,
}

impl ClassificationDecision {
    /// Build a decision from a ranked-first prediction and its taxonomy entry
    pub fn from_entry(entry: TaxonomyEntry, confidence: f32) -> Self {
        Self {
            label: entry.label,
            display_name: entry.display_name,
            icon: entry.icon,
            severity: entry.severity,
            responsible_party: entry.responsible_party,
            confidence,
        }
    }
}

/// One discrete unit of the simulated analysis narrative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisFinding {
    /// Position in the reveal order (ascending, unique)
    pub sequence: u32,
    /// Short headline ("Damage detected")
    pub title: String,
    /// Detail line ("Front collision, right-hand side")
    pub detail: String,
    /// Offset from timeline start at which this finding is revealed
    pub reveal_delay_ms: u64,
}

/// Submission wizard step
///
/// Fixed ordered sequence; navigation is strictly adjacent. Each step
/// carries a pure gate predicate over the in-progress draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStep {
    /// Confirm incident location
    Locate,
    /// Upload vehicle / road evidence photos
    Evidence,
    /// Incident description and details
    Details,
    /// Review and submit
    Review,
}

impl WizardStep {
    /// All steps in wizard order
    pub const ALL: [WizardStep; 4] = [
        WizardStep::Locate,
        WizardStep::Evidence,
        WizardStep::Details,
        WizardStep::Review,
    ];

    /// First step of the flow
    pub fn first() -> Self {
        WizardStep::Locate
    }

    /// Zero-based position within the flow
    pub fn index(self) -> usize {
        Self::ALL.iter().position(|s| *s == self).unwrap_or(0)
    }

    /// Next step, None at the terminal review step
    pub fn next(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Previous step, None at the first step
    pub fn prev(self) -> Option<Self> {
        self.index().checked_sub(1).and_then(|i| Self::ALL.get(i).copied())
    }

    /// Gate predicate: may the wizard advance past this step with this draft?
    ///
    /// Pure function of the draft. The review step is terminal and never
    /// advances.
    pub fn can_advance(self, draft: &ReportDraft) -> bool {
        match self {
            WizardStep::Locate => !draft.location_text.trim().is_empty(),
            WizardStep::Evidence => {
                draft.vehicle_image_ref.is_some() || draft.road_image_ref.is_some()
            }
            WizardStep::Details => {
                !draft.description.trim().is_empty() && !draft.location_text.trim().is_empty()
            }
            WizardStep::Review => false,
        }
    }

    /// Human-readable description of what this step's gate requires
    pub fn gate_requirement(self) -> &'static str {
        match self {
            WizardStep::Locate => "incident location is required",
            WizardStep::Evidence => "at least one evidence image is required",
            WizardStep::Details => "description and location text are required",
            WizardStep::Review => "review is the final step",
        }
    }
}

/// Mutable accumulator for an in-progress report
///
/// Owned exclusively by the wizard until submission; the classification
/// pipeline only ever receives the evidence image, never the draft itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportDraft {
    /// Reference to the uploaded vehicle photo (filename or URI)
    pub vehicle_image_ref: Option<String>,
    /// Reference to the uploaded road photo
    pub road_image_ref: Option<String>,
    /// Free-text incident description
    pub description: String,
    /// Human-readable location
    pub location_text: String,
    /// When the incident occurred
    pub occurred_at: DateTime<Utc>,
}

impl ReportDraft {
    pub fn new() -> Self {
        Self {
            vehicle_image_ref: None,
            road_image_ref: None,
            description: String::new(),
            location_text: String::new(),
            occurred_at: Utc::now(),
        }
    }
}

impl Default for ReportDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// Report processing status
///
/// Only `Created` is assigned in this service; later transitions belong to
/// the external tracking subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Created,
    Processing,
    Completed,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Created => "created",
            ReportStatus::Processing => "processing",
            ReportStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(ReportStatus::Created),
            "processing" => Some(ReportStatus::Processing),
            "completed" => Some(ReportStatus::Completed),
            _ => None,
        }
    }
}

/// Persisted incident report
///
/// Immutable once created; constructed only by successful wizard completion
/// and appended to the report store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub id: Uuid,
    /// Snapshot of the draft at submission time
    pub draft: ReportDraft,
    /// Optional: present when an evidence image was classified
    pub decision: Option<ClassificationDecision>,
    pub status: ReportStatus,
    pub submitted_at: DateTime<Utc>,
}
