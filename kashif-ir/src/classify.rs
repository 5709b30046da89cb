//! Classification pipeline
//!
//! Orchestrates the model gateway and the taxonomy mapper to turn one
//! evidence image into a ranked decision: infer, stable-sort by probability
//! descending, resolve the rank-0 label, and attach the full ranked list
//! for expanded display.
//!
//! Cancellation is last-submitted-image-wins: selecting a new image bumps a
//! generation counter, and an inference carrying a stale generation is
//! discarded when it resolves.

use crate::model::ModelGateway;
use crate::taxonomy;
use kashif_common::events::{EventBus, KashifEvent};
use kashif_common::types::{ClassificationDecision, Prediction};
use kashif_common::{Error, Result};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Ranked decision for one inference call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationOutcome {
    /// Decision driven by the rank-0 prediction
    pub decision: ClassificationDecision,
    /// Full ranked list, same length as the gateway output
    pub ranked: Vec<Prediction>,
}

/// Turns evidence images into ranked classification decisions
pub struct ClassificationPipeline {
    gateway: Arc<ModelGateway>,
    events: EventBus,
    /// Generation of the most recently selected image
    generation: AtomicU64,
}

impl ClassificationPipeline {
    pub fn new(gateway: Arc<ModelGateway>, events: EventBus) -> Self {
        Self {
            gateway,
            events,
            generation: AtomicU64::new(0),
        }
    }

    /// Mark a newly selected evidence image as current
    ///
    /// Returns the token to pass to [`classify`](Self::classify). Any
    /// outstanding inference holding an earlier token becomes stale.
    pub fn begin_image(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Classify one image
    ///
    /// Requires a Ready gateway (`NotReady` otherwise) and propagates
    /// `InferenceFailure`. Returns `Ok(None)` when the result arrived stale
    /// because a newer image was selected while inference was outstanding.
    pub async fn classify(
        &self,
        token: u64,
        image: &[u8],
    ) -> Result<Option<ClassificationOutcome>> {
        let predictions = self.gateway.infer(image).await?;

        if self.generation.load(Ordering::SeqCst) != token {
            debug!(token, "Discarding stale classification result");
            self.events.emit(KashifEvent::ClassificationDiscarded {
                timestamp: chrono::Utc::now(),
            });
            return Ok(None);
        }

        let ranked = rank(predictions);
        let top = ranked
            .first()
            .ok_or_else(|| Error::InferenceFailure("empty prediction set".to_string()))?;

        let entry = taxonomy::resolve(&top.label);
        let decision = ClassificationDecision::from_entry(entry, top.probability);

        info!(
            label = %decision.label,
            confidence = decision.confidence,
            "Classification completed"
        );
        self.events.emit(KashifEvent::ClassificationCompleted {
            decision: decision.clone(),
            timestamp: chrono::Utc::now(),
        });

        Ok(Some(ClassificationOutcome { decision, ranked }))
    }
}

/// Rank predictions by probability descending
///
/// `sort_by` is stable, so ties keep the gateway's original order. No
/// prediction is dropped: output length equals input length.
pub fn rank(mut predictions: Vec<Prediction>) -> Vec<Prediction> {
    predictions.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    predictions
}
