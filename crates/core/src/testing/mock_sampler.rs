//! Mock sampler for testing.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fleet::PipelineKey;
use crate::sampler::{ImageSample, Sampler, SamplerError};

/// Mock implementation of the Sampler trait.
///
/// Returns a small fixed JPEG-like sample unless a scripted result is queued
/// or the sampler is marked unavailable.
///
/// # Example
///
/// ```rust,ignore
/// use framewatch_core::testing::MockSampler;
///
/// let sampler = MockSampler::new();
/// sampler.push_error(SamplerError::Empty).await;
///
/// // First call fails, later calls succeed
/// assert!(sampler.sample(&key).await.is_err());
/// assert!(sampler.sample(&key).await.is_ok());
/// ```
#[derive(Debug)]
pub struct MockSampler {
    /// Keys passed to `sample`, in call order.
    calls: Arc<RwLock<Vec<PipelineKey>>>,
    /// Results returned before falling back to the default.
    script: Arc<RwLock<VecDeque<Result<ImageSample, SamplerError>>>>,
    /// When set, every unscripted call returns `SamplerError::Empty`.
    unavailable: Arc<RwLock<bool>>,
    /// Simulated call latency.
    delay: Arc<RwLock<Duration>>,
}

impl Default for MockSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl MockSampler {
    /// Create a new mock sampler.
    pub fn new() -> Self {
        Self {
            calls: Arc::new(RwLock::new(Vec::new())),
            script: Arc::new(RwLock::new(VecDeque::new())),
            unavailable: Arc::new(RwLock::new(false)),
            delay: Arc::new(RwLock::new(Duration::ZERO)),
        }
    }

    /// Queue a sample to return.
    pub async fn push_sample(&self, sample: ImageSample) {
        self.script.write().await.push_back(Ok(sample));
    }

    /// Queue an error to return.
    pub async fn push_error(&self, error: SamplerError) {
        self.script.write().await.push_back(Err(error));
    }

    /// Make unscripted calls fail with `SamplerError::Empty`.
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    /// Set the simulated latency of each call.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = delay;
    }

    /// Get every key sampled so far.
    pub async fn calls(&self) -> Vec<PipelineKey> {
        self.calls.read().await.clone()
    }

    /// Get the number of sample calls.
    pub async fn call_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Get the number of sample calls for one key.
    pub async fn calls_for(&self, key: &PipelineKey) -> usize {
        self.calls.read().await.iter().filter(|k| *k == key).count()
    }
}

#[async_trait]
impl Sampler for MockSampler {
    fn name(&self) -> &str {
        "mock"
    }

    async fn sample(&self, key: &PipelineKey) -> Result<ImageSample, SamplerError> {
        self.calls.write().await.push(key.clone());

        let delay = *self.delay.read().await;
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if let Some(result) = self.script.write().await.pop_front() {
            return result;
        }
        if *self.unavailable.read().await {
            return Err(SamplerError::Empty);
        }
        Ok(super::fixtures::sample())
    }
}
