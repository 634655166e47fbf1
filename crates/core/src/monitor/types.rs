//! Types for pipeline monitoring.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fleet::{LifecycleState, PipelineKey};

/// Result of one sampling iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IterationOutcome {
    /// No sample could be obtained; the baseline was reset.
    SampleUnavailable,
    /// The sample could not be scored; the baseline was reset.
    ScoreUnavailable,
    /// First valid score after a start or reset; nothing to compare against yet.
    Baseline { score: f64 },
    /// A difference was published.
    Published { diff: f64 },
    /// A difference was computed but every publish attempt failed.
    PublishFailed { diff: f64 },
}

impl IterationOutcome {
    /// Label used for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            IterationOutcome::SampleUnavailable => "sample_unavailable",
            IterationOutcome::ScoreUnavailable => "score_unavailable",
            IterationOutcome::Baseline { .. } => "baseline",
            IterationOutcome::Published { .. } => "published",
            IterationOutcome::PublishFailed { .. } => "publish_failed",
        }
    }
}

/// Result of a registry start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// A new worker was spawned.
    Started,
    /// A worker for the key already exists.
    AlreadyRunning,
    /// The registry has been shut down and accepts no new workers.
    ShuttingDown,
}

/// What the dispatcher did with one fleet event.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchAction {
    Start {
        key: PipelineKey,
        outcome: StartOutcome,
    },
    Stop {
        key: PipelineKey,
        /// Keys whose workers were actually stopped (may be empty).
        stopped: Vec<PipelineKey>,
    },
    /// The event's state is neither active nor inactive.
    Ignored {
        key: PipelineKey,
        state: LifecycleState,
    },
}

impl DispatchAction {
    /// Label used for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchAction::Start { .. } => "start",
            DispatchAction::Stop { .. } => "stop",
            DispatchAction::Ignored { .. } => "ignored",
        }
    }
}

/// Read-only view of one running worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerInfo {
    pub key: PipelineKey,
    pub started_at: DateTime<Utc>,
}
