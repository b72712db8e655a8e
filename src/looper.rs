use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use crate::classify::ClassifierAdapter;
use crate::notify::NotifierAdapter;
use crate::pipeline::{CycleOutcome, DetectionPipeline, PipelineError};
use crate::sampler::SnapshotSource;

/// How long to wait before the next tick. A cycle that overran the
/// interval gets zero delay — drift is corrected every cycle and never
/// accumulates into a backlog of catch-up ticks.
pub fn tick_delay(elapsed: Duration, interval: Duration) -> Duration {
    interval.saturating_sub(elapsed)
}

/// Drives the pipeline on a fixed cadence.
///
/// Cycles are strictly serialized: each tick awaits the full pipeline
/// run (success or failure) before the next is scheduled, so no two
/// cycles ever overlap. Nothing a cycle does can stop the loop; it ends
/// only with process shutdown.
pub struct LoopController<S, C, N> {
    pipeline: DetectionPipeline<S, C, N>,
    interval: Duration,
    cycles: u64,
}

impl<S, C, N> LoopController<S, C, N>
where
    S: SnapshotSource,
    C: ClassifierAdapter,
    N: NotifierAdapter,
{
    pub fn new(pipeline: DetectionPipeline<S, C, N>, interval: Duration) -> Self {
        Self {
            pipeline,
            interval,
            cycles: 0,
        }
    }

    /// Run one tick and return the delay before the next one.
    async fn tick(&mut self) -> Duration {
        let start = Instant::now();

        match self.pipeline.run_cycle().await {
            Ok(CycleOutcome::Skipped(decision)) => {
                debug!(?decision, "no action this cycle");
            }
            Ok(CycleOutcome::Notified { score, labels, .. }) => {
                info!(
                    score = format!("{score:.4}"),
                    labels = labels.len(),
                    "detection cycle completed"
                );
            }
            Err(e @ PipelineError::Notify(_)) => {
                // Fire-and-forget delivery: log and move on.
                warn!(error = %e, "notification delivery failed");
            }
            Err(e) => {
                error!(error = %e, "detection cycle failed");
            }
        }

        self.cycles += 1;
        if self.cycles % 100 == 0 {
            debug!(cycles = self.cycles, "cycles processed");
        }

        let elapsed = start.elapsed();
        if elapsed >= self.interval {
            warn!(
                elapsed_ms = elapsed.as_millis() as u64,
                interval_ms = self.interval.as_millis() as u64,
                "cycle overran the polling interval"
            );
        }
        tick_delay(elapsed, self.interval)
    }

    /// Poll forever. Only process shutdown ends the loop.
    pub async fn run(&mut self) {
        info!(interval_ms = self.interval.as_millis() as u64, "polling loop started");
        loop {
            let delay = self.tick().await;
            tokio::time::sleep(delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_fills_the_remaining_interval() {
        let delay = tick_delay(Duration::from_millis(300), Duration::from_millis(1000));
        assert_eq!(delay, Duration::from_millis(700));
    }

    #[test]
    fn overrun_yields_zero_delay_not_debt() {
        let delay = tick_delay(Duration::from_millis(2500), Duration::from_millis(1000));
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn exact_interval_yields_zero_delay() {
        let delay = tick_delay(Duration::from_millis(1000), Duration::from_millis(1000));
        assert_eq!(delay, Duration::ZERO);
    }
}
