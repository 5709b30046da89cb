//! Remote classification model provider
//!
//! The model's own protocol is out of scope here: the provider fetches an
//! opaque model reference plus its metadata document and returns a session
//! that scores images. The HTTP implementation talks to a hosted
//! image-classification model (reqwest); tests substitute their own
//! provider implementations.

use async_trait::async_trait;
use kashif_common::types::Prediction;
use kashif_common::{Error, Result};
use serde::Deserialize;
use tracing::{debug, info};

/// A loaded model session able to score images
///
/// Stateless per call: `predict` may be invoked repeatedly and concurrently
/// once the session exists.
#[async_trait]
pub trait InferenceSession: Send + Sync {
    /// Score one image, returning the full label distribution
    async fn predict(&self, image: &[u8]) -> Result<Vec<Prediction>>;

    /// Labels known to the model, in model output order
    fn labels(&self) -> &[String];
}

/// Acquires a model session from wherever the model lives
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Fetch model + metadata and build a session
    ///
    /// Network / resource acquisition happens here and only here.
    async fn fetch(&self) -> Result<Box<dyn InferenceSession>>;
}

/// Metadata document published alongside the model
#[derive(Debug, Deserialize)]
struct ModelMetadata {
    labels: Vec<String>,
}

/// Scoring response from the hosted model
#[derive(Debug, Deserialize)]
struct ScoreResponse {
    probabilities: Vec<f32>,
}

/// HTTP model provider
///
/// Resolves `model.json` / `metadata.json` relative to a base URL and
/// scores images via the model's `predict` endpoint.
pub struct HttpModelProvider {
    client: reqwest::Client,
    model_url: String,
    metadata_url: String,
    predict_url: String,
}

impl HttpModelProvider {
    pub fn new(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            client: reqwest::Client::new(),
            model_url: format!("{}/model.json", base),
            metadata_url: format!("{}/metadata.json", base),
            predict_url: format!("{}/predict", base),
        }
    }
}

#[async_trait]
impl ModelProvider for HttpModelProvider {
    async fn fetch(&self) -> Result<Box<dyn InferenceSession>> {
        debug!("Fetching model metadata from {}", self.metadata_url);

        let metadata: ModelMetadata = self
            .client
            .get(&self.metadata_url)
            .send()
            .await
            .map_err(|e| Error::ModelLoadFailure(format!("metadata fetch: {}", e)))?
            .error_for_status()
            .map_err(|e| Error::ModelLoadFailure(format!("metadata fetch: {}", e)))?
            .json()
            .await
            .map_err(|e| Error::ModelLoadFailure(format!("metadata parse: {}", e)))?;

        if metadata.labels.is_empty() {
            return Err(Error::ModelLoadFailure(
                "metadata contains no labels".to_string(),
            ));
        }

        // The model topology document is opaque to us; fetching it verifies
        // the model reference actually resolves before we report Ready.
        self.client
            .get(&self.model_url)
            .send()
            .await
            .map_err(|e| Error::ModelLoadFailure(format!("model fetch: {}", e)))?
            .error_for_status()
            .map_err(|e| Error::ModelLoadFailure(format!("model fetch: {}", e)))?;

        info!(
            labels = metadata.labels.len(),
            "Model acquired from {}", self.model_url
        );

        Ok(Box::new(HttpSession {
            client: self.client.clone(),
            predict_url: self.predict_url.clone(),
            labels: metadata.labels,
        }))
    }
}

struct HttpSession {
    client: reqwest::Client,
    predict_url: String,
    labels: Vec<String>,
}

#[async_trait]
impl InferenceSession for HttpSession {
    async fn predict(&self, image: &[u8]) -> Result<Vec<Prediction>> {
        use base64::Engine;

        let payload = serde_json::json!({
            "image": base64::engine::general_purpose::STANDARD.encode(image),
        });

        let response: ScoreResponse = self
            .client
            .post(&self.predict_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::InferenceFailure(format!("predict request: {}", e)))?
            .error_for_status()
            .map_err(|e| Error::InferenceFailure(format!("predict request: {}", e)))?
            .json()
            .await
            .map_err(|e| Error::InferenceFailure(format!("predict parse: {}", e)))?;

        if response.probabilities.len() != self.labels.len() {
            return Err(Error::InferenceFailure(format!(
                "model returned {} probabilities for {} labels",
                response.probabilities.len(),
                self.labels.len()
            )));
        }

        Ok(self
            .labels
            .iter()
            .zip(response.probabilities)
            .map(|(label, probability)| Prediction {
                label: label.clone(),
                probability,
            })
            .collect())
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }
}
