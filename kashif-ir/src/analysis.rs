//! Analysis timeline engine
//!
//! Models the "AI is working" stage as a deterministic, time-ordered reveal
//! rather than a black box: a fixed ordered list of findings, each with a
//! scheduled delay offset from timeline start. Findings are emitted from a
//! single task, strictly in list order, so timer jitter can never reorder
//! them. After the last finding's delay elapses the engine emits
//! `Completed`, which is the sole gate permitting report submission.
//!
//! `reset()` cancels further emissions, discards an in-flight completion,
//! and is the only way to leave `Completed` short of a fresh `start()`.

use kashif_common::events::{EventBus, KashifEvent};
use kashif_common::types::AnalysisFinding;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// Timeline lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisState {
    Idle,
    Running,
    Completed,
}

struct TimelineInner {
    /// Fixed reveal script, sorted by sequence ascending
    findings: Vec<AnalysisFinding>,
    state_tx: watch::Sender<AnalysisState>,
    /// Findings revealed so far in the current run
    revealed: Mutex<Vec<AnalysisFinding>>,
    /// Run generation; a bump invalidates the running emitter task
    generation: AtomicU64,
    events: EventBus,
}

impl TimelineInner {
    /// Lock the revealed list, recovering from a poisoned lock
    fn revealed_lock(&self) -> MutexGuard<'_, Vec<AnalysisFinding>> {
        self.revealed.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Deterministic staged reveal of analysis findings
#[derive(Clone)]
pub struct AnalysisTimeline {
    inner: Arc<TimelineInner>,
}

impl AnalysisTimeline {
    /// Create a timeline over a fixed finding script
    ///
    /// Findings are sorted by sequence so list order and reveal order agree
    /// regardless of input order.
    pub fn new(mut findings: Vec<AnalysisFinding>, events: EventBus) -> Self {
        findings.sort_by_key(|f| f.sequence);
        let (state_tx, _) = watch::channel(AnalysisState::Idle);
        Self {
            inner: Arc::new(TimelineInner {
                findings,
                state_tx,
                revealed: Mutex::new(Vec::new()),
                generation: AtomicU64::new(0),
                events,
            }),
        }
    }

    /// The default liability-analysis script
    ///
    /// An initial scanning period, then four staggered findings.
    pub fn default_findings() -> Vec<AnalysisFinding> {
        let script = [
            ("Damage detected", "Front collision, right-hand side"),
            ("Probable cause", "Road pothole, estimated depth 15 cm"),
            ("Severity assessment", "Moderate, immediate repair required"),
            ("Location match", "King Fahd Road, known maintenance corridor"),
        ];

        script
            .iter()
            .enumerate()
            .map(|(i, (title, detail))| AnalysisFinding {
                sequence: i as u32 + 1,
                title: title.to_string(),
                detail: detail.to_string(),
                // 2.5 s scanning period, then a 300 ms stagger per finding
                reveal_delay_ms: 2_500 + 300 * i as u64,
            })
            .collect()
    }

    /// Current lifecycle state
    pub fn state(&self) -> AnalysisState {
        *self.inner.state_tx.borrow()
    }

    /// Subscribe to state transitions
    pub fn subscribe(&self) -> watch::Receiver<AnalysisState> {
        self.inner.state_tx.subscribe()
    }

    /// Findings revealed so far, in sequence order
    pub fn revealed(&self) -> Vec<AnalysisFinding> {
        self.inner.revealed_lock().clone()
    }

    /// Begin emitting findings
    ///
    /// No-op while already running. From `Idle` or `Completed` the full
    /// sequence is re-emitted from the beginning.
    pub fn start(&self) {
        let generation;
        {
            let mut revealed = self.inner.revealed_lock();
            if *self.inner.state_tx.borrow() == AnalysisState::Running {
                return;
            }
            revealed.clear();
            generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
            self.inner.state_tx.send_replace(AnalysisState::Running);
        }

        self.inner.events.emit(KashifEvent::AnalysisStarted {
            timestamp: chrono::Utc::now(),
        });

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut elapsed_ms = 0u64;
            for finding in &inner.findings {
                let wait = finding.reveal_delay_ms.saturating_sub(elapsed_ms);
                tokio::time::sleep(Duration::from_millis(wait)).await;
                elapsed_ms = elapsed_ms.max(finding.reveal_delay_ms);

                // Reveal under the lock so a concurrent reset() can never
                // interleave between the staleness check and the emission.
                {
                    let mut revealed = inner.revealed_lock();
                    if inner.generation.load(Ordering::SeqCst) != generation {
                        debug!(generation, "Timeline run superseded, stopping emission");
                        return;
                    }
                    revealed.push(finding.clone());
                }

                debug!(sequence = finding.sequence, "Finding revealed");
                inner.events.emit(KashifEvent::FindingRevealed {
                    finding: finding.clone(),
                    timestamp: chrono::Utc::now(),
                });
            }

            {
                let _revealed = inner.revealed_lock();
                if inner.generation.load(Ordering::SeqCst) != generation {
                    // Reset raced the final delay: discard the completion.
                    return;
                }
                inner.state_tx.send_replace(AnalysisState::Completed);
            }

            inner.events.emit(KashifEvent::AnalysisCompleted {
                timestamp: chrono::Utc::now(),
            });
        });
    }

    /// Return to `Idle` from any state
    ///
    /// Clears the revealed subset, stops further emissions from a running
    /// task, and discards an in-flight `Completed` signal.
    pub fn reset(&self) {
        let mut revealed = self.inner.revealed_lock();
        self.inner.generation.fetch_add(1, Ordering::SeqCst);
        revealed.clear();
        self.inner.state_tx.send_replace(AnalysisState::Idle);
    }
}
