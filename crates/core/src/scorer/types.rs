//! Types for image scoring.

use async_trait::async_trait;
use thiserror::Error;

use crate::sampler::ImageSample;

/// Errors that can occur while scoring a sample.
#[derive(Debug, Clone, Error)]
pub enum ScorerError {
    /// The analysis completed without the quality properties we score on.
    #[error("Analysis returned no quality properties")]
    MissingQuality,

    #[error("API error: {0}")]
    Api(String),
}

/// Trait for image quality scorers.
///
/// A score is a single scalar; only differences between consecutive scores of
/// the same pipeline are meaningful.
#[async_trait]
pub trait Scorer: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Compute the quality score of one image sample.
    async fn score(&self, sample: &ImageSample) -> Result<f64, ScorerError>;
}
