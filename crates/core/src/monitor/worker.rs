//! Per-pipeline sampling loop.
//!
//! Each iteration fetches a still image, scores it, and publishes the absolute
//! difference from the previous score. Any failure to sample or score resets
//! the baseline, so a difference is only ever published between two
//! back-to-back successful iterations.

use std::sync::Arc;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::fleet::PipelineKey;
use crate::metrics::{ITERATIONS, ITERATION_DURATION, PUBLISH_ATTEMPTS};
use crate::publisher::{MetricPoint, Publisher};
use crate::sampler::Sampler;
use crate::scorer::Scorer;

use super::config::WorkerConfig;
use super::types::IterationOutcome;

/// The external services a worker calls.
#[derive(Clone)]
pub struct WorkerAdapters {
    pub sampler: Arc<dyn Sampler>,
    pub scorer: Arc<dyn Scorer>,
    pub publisher: Arc<dyn Publisher>,
}

impl std::fmt::Debug for WorkerAdapters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerAdapters")
            .field("sampler", &self.sampler.name())
            .field("scorer", &self.scorer.name())
            .field("publisher", &self.publisher.name())
            .finish()
    }
}

/// Difference baseline carried between iterations of one worker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoopState {
    previous: Option<f64>,
}

impl LoopState {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last valid score, if the previous iteration produced one.
    pub fn previous(&self) -> Option<f64> {
        self.previous
    }

    /// Forget the baseline after a failed sample or score.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Record a valid score, returning the difference from the baseline if
    /// there was one.
    pub fn observe(&mut self, score: f64) -> Option<f64> {
        let diff = self.previous.map(|previous| (score - previous).abs());
        self.previous = Some(score);
        diff
    }
}

/// Sampling loop for a single pipeline.
#[derive(Debug)]
pub struct MonitoringWorker {
    key: PipelineKey,
    adapters: WorkerAdapters,
    config: WorkerConfig,
}

impl MonitoringWorker {
    pub fn new(key: PipelineKey, adapters: WorkerAdapters, config: WorkerConfig) -> Self {
        Self {
            key,
            adapters,
            config,
        }
    }

    pub fn key(&self) -> &PipelineKey {
        &self.key
    }

    /// Run until `cancel` fires.
    ///
    /// Cancellation is observed before each iteration and while waiting out the
    /// rest of the interval; an iteration already in flight runs to completion.
    pub async fn run(self, cancel: CancellationToken) {
        debug!(group = %self.key.group, pipeline = self.key.pipeline, "Worker started");
        let mut state = LoopState::new();

        loop {
            if cancel.is_cancelled() {
                break;
            }

            let started = Instant::now();
            let outcome = self.run_iteration(&mut state, &cancel).await;
            ITERATIONS.with_label_values(&[outcome.as_str()]).inc();
            ITERATION_DURATION.observe(started.elapsed().as_secs_f64());

            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep_until(started + self.config.interval) => {}
            }
        }

        debug!(group = %self.key.group, pipeline = self.key.pipeline, "Worker exiting");
    }

    /// Perform one sample -> score -> difference -> publish pass.
    pub async fn run_iteration(
        &self,
        state: &mut LoopState,
        cancel: &CancellationToken,
    ) -> IterationOutcome {
        let sample = match self.adapters.sampler.sample(&self.key).await {
            Ok(sample) => sample,
            Err(e) => {
                warn!(
                    group = %self.key.group,
                    pipeline = self.key.pipeline,
                    error = %e,
                    "Failed to obtain sample"
                );
                state.reset();
                return IterationOutcome::SampleUnavailable;
            }
        };

        let score = match self.adapters.scorer.score(&sample).await {
            Ok(score) => score,
            Err(e) => {
                error!(
                    group = %self.key.group,
                    pipeline = self.key.pipeline,
                    error = %e,
                    "Error scoring sample"
                );
                state.reset();
                return IterationOutcome::ScoreUnavailable;
            }
        };

        let Some(diff) = state.observe(score) else {
            debug!(
                group = %self.key.group,
                pipeline = self.key.pipeline,
                score,
                "Baseline established"
            );
            return IterationOutcome::Baseline { score };
        };

        let point = MetricPoint::now(self.key.clone(), diff);
        if self.publish_with_retry(&point, cancel).await {
            IterationOutcome::Published { diff }
        } else {
            IterationOutcome::PublishFailed { diff }
        }
    }

    /// Publish with bounded retries. Returns whether the point was accepted.
    async fn publish_with_retry(&self, point: &MetricPoint, cancel: &CancellationToken) -> bool {
        let attempts = self.config.publish_retries + 1;

        for attempt in 1..=attempts {
            match self.adapters.publisher.publish(point).await {
                Ok(()) => {
                    PUBLISH_ATTEMPTS.with_label_values(&["success"]).inc();
                    return true;
                }
                Err(e) => {
                    PUBLISH_ATTEMPTS.with_label_values(&["error"]).inc();

                    if attempt == attempts {
                        error!(
                            group = %self.key.group,
                            pipeline = self.key.pipeline,
                            attempts,
                            error = %e,
                            "Dropping metric after failed publish attempts"
                        );
                        return false;
                    }

                    warn!(
                        group = %self.key.group,
                        pipeline = self.key.pipeline,
                        attempt,
                        error = %e,
                        "Publish failed, retrying"
                    );
                    tokio::select! {
                        biased;

                        _ = cancel.cancelled() => return false,
                        _ = tokio::time::sleep(self.config.publish_retry_delay) => {}
                    }
                }
            }
        }

        false
    }
}
