use chrono::Utc;
use std::io::Write;
use tracing::{debug, info};

use crate::classify::{filter_by_confidence, Classification, ClassifierAdapter, ClassifyError};
use crate::config::DetectionConfig;
use crate::diff::{self, DiffError};
use crate::frame::FrameStore;
use crate::gate;
use crate::notify::{NotifierAdapter, NotifyError};
use crate::sampler::{SampleError, Sampler, SnapshotSource};

/// Why a cycle stopped before classifying, or that it went the distance.
#[derive(Debug, Clone, PartialEq)]
pub enum DetectionDecision {
    /// No comparable frame pair yet (first cycle or two after startup).
    NotReady,
    /// Inside the cooldown window after the previous detection.
    TooSoon,
    /// Below the dissimilarity threshold. Equality counts as similar.
    Similar(f64),
    /// Above the threshold — classification and notification follow.
    Dissimilar(f64),
}

/// Result of one full pipeline cycle.
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Skipped(DetectionDecision),
    Notified {
        score: f64,
        labels: Vec<Classification>,
        message_id: String,
    },
}

/// Dissimilarity fires only on a strictly greater score: a difference
/// landing exactly on the threshold counts as similar.
fn decide(score: f64, threshold: f64) -> DetectionDecision {
    if score > threshold {
        DetectionDecision::Dissimilar(score)
    } else {
        DetectionDecision::Similar(score)
    }
}

/// One detect→classify→notify pass per tick.
///
/// Owns the frame store; the adapters are external collaborators. Every
/// stage may short-circuit the cycle with a non-error "no action"
/// outcome, and any stage failure aborts just this cycle — the loop
/// drives the next tick regardless.
pub struct DetectionPipeline<S, C, N> {
    store: FrameStore,
    sampler: Sampler<S>,
    classifier: C,
    notifier: N,
    camera_name: String,
    detection: DetectionConfig,
    confidence_threshold: f64,
}

impl<S, C, N> DetectionPipeline<S, C, N>
where
    S: SnapshotSource,
    C: ClassifierAdapter,
    N: NotifierAdapter,
{
    pub fn new(
        sampler: Sampler<S>,
        classifier: C,
        notifier: N,
        camera_name: String,
        detection: DetectionConfig,
        confidence_threshold: f64,
    ) -> Self {
        Self {
            store: FrameStore::new(),
            sampler,
            classifier,
            notifier,
            camera_name,
            detection,
            confidence_threshold,
        }
    }

    /// Steps 1–4: acquire, cooldown check, diff, and — on a confirmed
    /// detection — commit the detection timestamp. The timestamp is
    /// committed before classification so a slow or failing classifier
    /// call cannot reopen the cooldown window for the next tick.
    async fn evaluate(&mut self) -> Result<DetectionDecision, PipelineError> {
        if !self.sampler.acquire(&mut self.store).await? {
            return Ok(DetectionDecision::NotReady);
        }

        let now_ms = Utc::now().timestamp_millis();
        if gate::should_suppress(
            now_ms,
            self.store.last_detection_at_ms(),
            self.detection.cooldown_ms,
        ) {
            return Ok(DetectionDecision::TooSoon);
        }

        let (last, current) = self
            .store
            .pair()
            .ok_or(PipelineError::MissingFrame)?;
        let score = diff::diff(last, current)?;

        match decide(score, self.detection.diff_threshold) {
            DetectionDecision::Dissimilar(score) => {
                self.store.mark_detection(now_ms);
                Ok(DetectionDecision::Dissimilar(score))
            }
            decision => Ok(decision),
        }
    }

    /// Run one full cycle. Internal short-circuits are `Ok(Skipped(..))`;
    /// stage failures come back as `PipelineError` for the loop to log.
    pub async fn run_cycle(&mut self) -> Result<CycleOutcome, PipelineError> {
        let score = match self.evaluate().await? {
            DetectionDecision::Dissimilar(score) => score,
            decision => {
                debug!(?decision, "cycle skipped");
                return Ok(CycleOutcome::Skipped(decision));
            }
        };

        info!(
            score = format!("{score:.4}"),
            threshold = self.detection.diff_threshold,
            "change detected"
        );

        let frame = self.store.current().ok_or(PipelineError::MissingFrame)?;

        // Scoped artifact: deleted on drop, whatever happens below.
        let mut artifact = tempfile::Builder::new()
            .prefix("snapwatch-")
            .suffix(".jpg")
            .tempfile()
            .map_err(PipelineError::Artifact)?;
        artifact
            .write_all(&frame.jpeg)
            .map_err(PipelineError::Artifact)?;

        let labels = self.classifier.classify(&frame.jpeg).await?;
        let labels = filter_by_confidence(labels, self.confidence_threshold);
        debug!(kept = labels.len(), "labels after confidence filter");

        let message_id = self
            .notifier
            .notify(&self.camera_name, &labels, artifact.path())
            .await?;

        info!(
            message_id,
            labels = ?labels.iter().map(|c| c.label.as_str()).collect::<Vec<_>>(),
            "notification sent"
        );

        Ok(CycleOutcome::Notified {
            score,
            labels,
            message_id,
        })
    }

    #[cfg(test)]
    pub(crate) fn store(&self) -> &FrameStore {
        &self.store
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("acquire stage: {0}")]
    Sample(#[from] SampleError),
    #[error("diff stage: {0}")]
    Diff(#[from] DiffError),
    #[error("artifact stage: {0}")]
    Artifact(std::io::Error),
    #[error("classify stage: {0}")]
    Classify(#[from] ClassifyError),
    #[error("notify stage: {0}")]
    Notify(#[from] NotifyError),
    #[error("frame store lost a frame mid-cycle")]
    MissingFrame,
}
