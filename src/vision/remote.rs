//! Remote inference model
//!
//! Sends raw frames to an inference service over HTTP and maps the returned
//! boxes to [`Candidate`]s.
//!
//! Request: `POST <url>?width=W&height=H&format=bgra` with the pixel buffer
//! as an `application/octet-stream` body.
//!
//! Response:
//! ```json
//! {"detections": [{"class_id": 9, "confidence": 0.91, "bbox": [100.0, 50.0, 130.0, 80.0]}]}
//! ```

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use serde::Deserialize;
use tokio::runtime::Handle;

use super::classifier::Model;
use super::detection::{BoundingBox, Candidate};
use super::frame::Frame;
use super::labels::LabelTable;
use crate::error::{Error, Result};

/// Remote model settings
#[derive(Debug, Clone)]
pub struct RemoteModelConfig {
    /// Inference endpoint
    pub url: String,

    /// Per-request timeout
    pub timeout: Duration,
}

impl RemoteModelConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: Duration::from_secs(2),
        }
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[derive(Debug, Deserialize)]
struct InferResponse {
    #[serde(default)]
    detections: Vec<RemoteBox>,
}

#[derive(Debug, Deserialize)]
struct RemoteBox {
    class_id: u32,
    confidence: f32,
    bbox: [f32; 4],
}

impl RemoteBox {
    /// Confidence is clamped to [0, 1]; a box without a finite confidence
    /// is dropped
    fn into_candidate(self, labels: &LabelTable) -> Option<Candidate> {
        if !self.confidence.is_finite() {
            tracing::debug!(class_id = self.class_id, "Dropping box without a usable confidence");
            return None;
        }
        let confidence = self.confidence.clamp(0.0, 1.0);
        let [x1, y1, x2, y2] = self.bbox;
        let bbox = BoundingBox::new(
            x1.min(x2) as i32,
            y1.min(y2) as i32,
            x1.max(x2) as i32,
            y1.max(y2) as i32,
        );
        Some(Candidate::new(labels.label(self.class_id), confidence, bbox))
    }
}

/// Model backed by an HTTP inference service
///
/// The sampler runs on its own thread, so each call blocks that thread on
/// the async runtime it was given.
pub struct RemoteModel {
    client: Client,
    url: Url,
    labels: LabelTable,
    runtime: Handle,
}

impl RemoteModel {
    /// Create a client for the given endpoint
    ///
    /// Fails on a malformed URL; nothing is sent until the first frame.
    pub fn new(config: &RemoteModelConfig, labels: LabelTable, runtime: Handle) -> Result<Self> {
        let url = Url::parse(&config.url)
            .map_err(|e| Error::Config(format!("invalid model URL {:?}: {}", config.url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "model URL {:?} must use http or https",
                config.url
            )));
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            url,
            labels,
            runtime,
        })
    }

    async fn request(&self, frame: &Frame) -> Result<Vec<Candidate>> {
        let response = self
            .client
            .post(self.url.clone())
            .query(&[
                ("width", frame.width.to_string()),
                ("height", frame.height.to_string()),
                ("format", "bgra".to_string()),
            ])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(frame.data.clone())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::Inference(format!(
                "model endpoint returned status {}",
                response.status()
            )));
        }

        let body: InferResponse = response.json().await?;
        Ok(body
            .detections
            .into_iter()
            .filter_map(|b| b.into_candidate(&self.labels))
            .collect())
    }
}

impl Model for RemoteModel {
    fn infer(&mut self, frame: &Frame) -> Result<Vec<Candidate>> {
        self.runtime.block_on(self.request(frame))
    }
}
