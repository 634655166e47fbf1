//! Types for image sampling.

use async_trait::async_trait;
use thiserror::Error;

use crate::fleet::PipelineKey;

/// Errors that can occur while sampling a pipeline.
#[derive(Debug, Clone, Error)]
pub enum SamplerError {
    /// The source answered but had no image for the pipeline.
    #[error("No sample available")]
    Empty,

    #[error("API error: {0}")]
    Api(String),

    #[error("Failed to decode sample: {0}")]
    Decode(String),
}

/// One encoded still image (JPEG) of a pipeline's output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSample {
    pub data: Vec<u8>,
}

impl ImageSample {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Trait for image sample sources.
#[async_trait]
pub trait Sampler: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Fetch the current still image for a pipeline.
    async fn sample(&self, key: &PipelineKey) -> Result<ImageSample, SamplerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_sample_len() {
        let sample = ImageSample::new(vec![0xff, 0xd8, 0xff]);
        assert_eq!(sample.len(), 3);
        assert!(!sample.is_empty());
        assert!(ImageSample::new(Vec::new()).is_empty());
    }

    #[test]
    fn test_error_display() {
        assert_eq!(SamplerError::Empty.to_string(), "No sample available");
        assert_eq!(
            SamplerError::Api("throttled".to_string()).to_string(),
            "API error: throttled"
        );
    }
}
