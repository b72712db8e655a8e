use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::ClassifierConfig;

/// One label returned by the classification service. Confidence is a
/// 0–100 score, as the service reports it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Classification {
    pub label: String,
    pub confidence: f64,
}

/// Image-labeling service boundary: frame bytes in, labeled confidences
/// out. Service errors (quota, timeout, malformed image) come back as
/// recoverable `ClassifyError`s.
#[async_trait]
pub trait ClassifierAdapter: Send + Sync {
    async fn classify(&self, jpeg: &[u8]) -> Result<Vec<Classification>, ClassifyError>;
}

/// HTTP classifier: POSTs the raw JPEG and parses a JSON array of
/// `{"label": ..., "confidence": ...}` objects.
pub struct HttpClassifier {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl HttpClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, ClassifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(ClassifyError::Http)?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl ClassifierAdapter for HttpClassifier {
    async fn classify(&self, jpeg: &[u8]) -> Result<Vec<Classification>, ClassifyError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "image/jpeg")
            .body(jpeg.to_vec())
            .send()
            .await
            .map_err(ClassifyError::Http)?;

        if !response.status().is_success() {
            return Err(ClassifyError::HttpStatus(response.status().as_u16()));
        }

        let body = response.bytes().await.map_err(ClassifyError::Http)?;
        let labels: Vec<Classification> =
            serde_json::from_slice(&body).map_err(|e| ClassifyError::Malformed(e.to_string()))?;
        debug!(labels = labels.len(), "classifier response parsed");
        Ok(labels)
    }
}

/// Keep labels strictly above the confidence threshold, preserving the
/// service's own ordering. An empty result is valid — something changed
/// but nothing recognizable was found.
pub fn filter_by_confidence(labels: Vec<Classification>, threshold: f64) -> Vec<Classification> {
    labels
        .into_iter()
        .filter(|c| c.confidence > threshold)
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error("classifier request failed: {0}")]
    Http(reqwest::Error),
    #[error("classifier returned HTTP {0}")]
    HttpStatus(u16),
    #[error("malformed classifier response: {0}")]
    Malformed(String),
}
