//! Mock scorer for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::sampler::ImageSample;
use crate::scorer::{Scorer, ScorerError};

/// Mock implementation of the Scorer trait.
///
/// Returns queued results in order, then a configurable default score.
#[derive(Debug)]
pub struct MockScorer {
    script: Arc<RwLock<VecDeque<Result<f64, ScorerError>>>>,
    default_score: Arc<RwLock<f64>>,
    calls: Arc<RwLock<usize>>,
}

impl Default for MockScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockScorer {
    /// Create a new mock scorer with a default score of 100.
    pub fn new() -> Self {
        Self {
            script: Arc::new(RwLock::new(VecDeque::new())),
            default_score: Arc::new(RwLock::new(100.0)),
            calls: Arc::new(RwLock::new(0)),
        }
    }

    /// Queue a score to return.
    pub async fn push_score(&self, score: f64) {
        self.script.write().await.push_back(Ok(score));
    }

    /// Queue several scores to return.
    pub async fn push_scores(&self, scores: &[f64]) {
        self.script
            .write()
            .await
            .extend(scores.iter().copied().map(Ok));
    }

    /// Queue an error to return.
    pub async fn push_error(&self, error: ScorerError) {
        self.script.write().await.push_back(Err(error));
    }

    /// Set the score returned once the script is exhausted.
    pub async fn set_default_score(&self, score: f64) {
        *self.default_score.write().await = score;
    }

    /// Get the number of score calls.
    pub async fn call_count(&self) -> usize {
        *self.calls.read().await
    }
}

#[async_trait]
impl Scorer for MockScorer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn score(&self, _sample: &ImageSample) -> Result<f64, ScorerError> {
        *self.calls.write().await += 1;

        if let Some(result) = self.script.write().await.pop_front() {
            return result;
        }
        Ok(*self.default_score.read().await)
    }
}
