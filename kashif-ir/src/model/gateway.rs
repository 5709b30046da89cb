//! Classification model gateway
//!
//! Owns the model lifecycle: `Unloaded → Loading → Ready`, or
//! `Loading → Error` with user-initiated retry re-entering `Loading`.
//!
//! Load is single-in-flight: the first caller performs the acquisition
//! while any concurrent caller waits on the phase channel and observes the
//! in-flight outcome, so duplicate network fetches never occur.

use crate::model::provider::{InferenceSession, ModelProvider};
use kashif_common::events::{EventBus, KashifEvent};
use kashif_common::types::Prediction;
use kashif_common::{Error, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{watch, Mutex, RwLock};
use tracing::{info, warn};

/// Gateway lifecycle phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "detail", rename_all = "snake_case")]
pub enum GatewayPhase {
    Unloaded,
    Loading,
    Ready,
    Error(String),
}

/// Owns model acquisition and exposes the single inference operation
pub struct ModelGateway {
    provider: Box<dyn ModelProvider>,
    session: RwLock<Option<Arc<dyn InferenceSession>>>,
    phase_tx: watch::Sender<GatewayPhase>,
    load_lock: Mutex<()>,
    events: EventBus,
}

impl ModelGateway {
    pub fn new(provider: Box<dyn ModelProvider>, events: EventBus) -> Self {
        let (phase_tx, _) = watch::channel(GatewayPhase::Unloaded);
        Self {
            provider,
            session: RwLock::new(None),
            phase_tx,
            load_lock: Mutex::new(()),
            events,
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> GatewayPhase {
        self.phase_tx.borrow().clone()
    }

    /// Subscribe to phase transitions
    pub fn subscribe(&self) -> watch::Receiver<GatewayPhase> {
        self.phase_tx.subscribe()
    }

    /// Acquire the model
    ///
    /// Idempotent once Ready. If an acquisition is already in flight, this
    /// call does not start another one; it waits and returns the in-flight
    /// outcome. A later call after a failure re-enters Loading (retry is
    /// user-initiated, never automatic).
    pub async fn load(&self) -> Result<()> {
        if self.phase() == GatewayPhase::Ready {
            return Ok(());
        }

        match self.load_lock.try_lock() {
            Ok(_guard) => self.run_load().await,
            Err(_) => self.observe_inflight_load().await,
        }
    }

    /// Score one image
    ///
    /// Stateless per call; fails with `NotReady` before the gateway reaches
    /// Ready and propagates `InferenceFailure` from the session.
    pub async fn infer(&self, image: &[u8]) -> Result<Vec<Prediction>> {
        let session = self
            .session
            .read()
            .await
            .clone()
            .ok_or(Error::NotReady)?;

        session.predict(image).await.map_err(|e| match e {
            Error::InferenceFailure(_) => e,
            other => Error::InferenceFailure(other.to_string()),
        })
    }

    /// Perform the acquisition while holding the load lock
    async fn run_load(&self) -> Result<()> {
        // A load that finished while we were waiting for the lock satisfies
        // this call.
        if self.phase() == GatewayPhase::Ready {
            return Ok(());
        }

        self.phase_tx.send_replace(GatewayPhase::Loading);
        self.events.emit(KashifEvent::ModelLoadStarted {
            timestamp: chrono::Utc::now(),
        });

        match self.provider.fetch().await {
            Ok(session) => {
                let label_count = session.labels().len();
                *self.session.write().await = Some(Arc::from(session));
                self.phase_tx.send_replace(GatewayPhase::Ready);
                info!(labels = label_count, "Classification model ready");
                self.events.emit(KashifEvent::ModelReady {
                    label_count,
                    timestamp: chrono::Utc::now(),
                });
                Ok(())
            }
            Err(e) => {
                let message = e.to_string();
                self.phase_tx
                    .send_replace(GatewayPhase::Error(message.clone()));
                warn!("Model load failed: {}", message);
                self.events.emit(KashifEvent::ModelLoadFailed {
                    error: message.clone(),
                    timestamp: chrono::Utc::now(),
                });
                Err(Error::ModelLoadFailure(message))
            }
        }
    }

    /// Wait for the in-flight acquisition and report its outcome
    async fn observe_inflight_load(&self) -> Result<()> {
        let mut rx = self.phase_tx.subscribe();
        loop {
            match &*rx.borrow_and_update() {
                GatewayPhase::Ready => return Ok(()),
                GatewayPhase::Error(message) => {
                    return Err(Error::ModelLoadFailure(message.clone()))
                }
                GatewayPhase::Unloaded | GatewayPhase::Loading => {}
            }
            if rx.changed().await.is_err() {
                return Err(Error::Internal("gateway dropped during load".to_string()));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    struct StaticSession {
        labels: Vec<String>,
        predictions: Vec<Prediction>,
    }

    #[async_trait]
    impl InferenceSession for StaticSession {
        async fn predict(&self, _image: &[u8]) -> Result<Vec<Prediction>> {
            Ok(self.predictions.clone())
        }

        fn labels(&self) -> &[String] {
            &self.labels
        }
    }

    struct CountingProvider {
        fetches: Arc<AtomicUsize>,
        fail: Arc<AtomicBool>,
        delay_ms: u64,
    }

    #[async_trait]
    impl ModelProvider for CountingProvider {
        async fn fetch(&self) -> Result<Box<dyn InferenceSession>> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if self.delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.delay_ms)).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(Error::ModelLoadFailure("synthetic failure".to_string()));
            }
            Ok(Box::new(StaticSession {
                labels: vec!["Pothole".to_string(), "Plain".to_string()],
                predictions: vec![
                    Prediction {
                        label: "Pothole".to_string(),
                        probability: 0.7,
                    },
                    Prediction {
                        label: "Plain".to_string(),
                        probability: 0.3,
                    },
                ],
            }))
        }
    }

    fn gateway_with(provider: CountingProvider) -> Arc<ModelGateway> {
        Arc::new(ModelGateway::new(Box::new(provider), EventBus::new(16)))
    }

    #[tokio::test]
    async fn test_infer_before_load_is_not_ready() {
        let gateway = gateway_with(CountingProvider {
            fetches: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
            delay_ms: 0,
        });

        assert_eq!(gateway.phase(), GatewayPhase::Unloaded);
        assert!(matches!(gateway.infer(b"img").await, Err(Error::NotReady)));
    }

    #[tokio::test]
    async fn test_load_then_infer() {
        let gateway = gateway_with(CountingProvider {
            fetches: Arc::new(AtomicUsize::new(0)),
            fail: Arc::new(AtomicBool::new(false)),
            delay_ms: 0,
        });

        gateway.load().await.unwrap();
        assert_eq!(gateway.phase(), GatewayPhase::Ready);

        let predictions = gateway.infer(b"img").await.unwrap();
        assert_eq!(predictions.len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_loads_share_one_acquisition() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let gateway = gateway_with(CountingProvider {
            fetches: Arc::clone(&fetches),
            fail: Arc::new(AtomicBool::new(false)),
            delay_ms: 50,
        });

        let a = tokio::spawn({
            let g = Arc::clone(&gateway);
            async move { g.load().await }
        });
        let b = tokio::spawn({
            let g = Arc::clone(&gateway);
            async move { g.load().await }
        });

        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_reports_error_and_retry_reloads() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let fail = Arc::new(AtomicBool::new(true));
        let gateway = gateway_with(CountingProvider {
            fetches: Arc::clone(&fetches),
            fail: Arc::clone(&fail),
            delay_ms: 0,
        });

        assert!(matches!(
            gateway.load().await,
            Err(Error::ModelLoadFailure(_))
        ));
        assert!(matches!(gateway.phase(), GatewayPhase::Error(_)));
        // Inference still refuses: the model never became ready
        assert!(matches!(gateway.infer(b"img").await, Err(Error::NotReady)));

        // User-initiated retry re-enters Loading and succeeds
        fail.store(false, Ordering::SeqCst);
        gateway.load().await.unwrap();
        assert_eq!(gateway.phase(), GatewayPhase::Ready);
        assert_eq!(fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_load_is_idempotent_once_ready() {
        let fetches = Arc::new(AtomicUsize::new(0));
        let gateway = gateway_with(CountingProvider {
            fetches: Arc::clone(&fetches),
            fail: Arc::new(AtomicBool::new(false)),
            delay_ms: 0,
        });

        gateway.load().await.unwrap();
        gateway.load().await.unwrap();
        assert_eq!(fetches.load(Ordering::SeqCst), 1);
    }
}
