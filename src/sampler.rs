use async_trait::async_trait;
use chrono::Utc;
use image::ImageReader;
use std::io::Cursor;
use std::time::Duration;
use tracing::debug;

use crate::frame::{Frame, FrameStore};

/// Where snapshots come from. The HTTP camera is the real implementation;
/// tests swap in canned bytes.
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch one encoded snapshot from the source.
    async fn fetch(&self) -> Result<Vec<u8>, SampleError>;
}

/// Polls a camera snapshot endpoint over HTTP.
pub struct HttpSnapshotSource {
    client: reqwest::Client,
    url: String,
}

impl HttpSnapshotSource {
    pub fn new(url: String) -> Result<Self, SampleError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(SampleError::Http)?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self) -> Result<Vec<u8>, SampleError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(SampleError::Http)?;
        if !response.status().is_success() {
            return Err(SampleError::HttpStatus(response.status().as_u16()));
        }
        let bytes = response.bytes().await.map_err(SampleError::Http)?;
        Ok(bytes.to_vec())
    }
}

/// Acquires frames from a source and rotates them into the store.
pub struct Sampler<S> {
    source: S,
}

impl<S: SnapshotSource> Sampler<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetch, decode, and install one frame. Returns whether the store
    /// now holds a comparable pair. On fetch or decode failure the store
    /// is left untouched — decoding happens before any rotation.
    pub async fn acquire(&self, store: &mut FrameStore) -> Result<bool, SampleError> {
        let encoded = self.source.fetch().await?;
        let image = ImageReader::new(Cursor::new(&encoded))
            .with_guessed_format()
            .map_err(|e| SampleError::Decode(e.to_string()))?
            .decode()
            .map_err(|e| SampleError::Decode(e.to_string()))?
            .to_rgba8();

        let captured_at_ms = Utc::now().timestamp_millis();
        debug!(
            bytes = encoded.len(),
            width = image.width(),
            height = image.height(),
            "acquired snapshot"
        );

        Ok(store.install(Frame::new(image, encoded, captured_at_ms)))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SampleError {
    #[error("snapshot request failed: {0}")]
    Http(reqwest::Error),
    #[error("snapshot endpoint returned HTTP {0}")]
    HttpStatus(u16),
    #[error("failed to decode snapshot: {0}")]
    Decode(String),
}
