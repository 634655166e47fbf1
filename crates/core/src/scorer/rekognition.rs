//! Rekognition image-properties scorer.

use std::time::Instant;

use async_trait::async_trait;
use aws_sdk_rekognition::error::DisplayErrorContext;
use aws_sdk_rekognition::primitives::Blob;
use aws_sdk_rekognition::types::{DetectLabelsFeatureName, Image};
use aws_sdk_rekognition::Client;

use crate::metrics::record_external_call;
use crate::sampler::ImageSample;

use super::{Scorer, ScorerError};

/// Scores samples with Rekognition `DetectLabels` image properties.
///
/// The score is brightness + sharpness + contrast, truncated to a whole number.
#[derive(Debug, Clone)]
pub struct RekognitionScorer {
    client: Client,
}

impl RekognitionScorer {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Scorer for RekognitionScorer {
    fn name(&self) -> &str {
        "rekognition"
    }

    async fn score(&self, sample: &ImageSample) -> Result<f64, ScorerError> {
        let image = Image::builder()
            .bytes(Blob::new(sample.data.clone()))
            .build();

        let started = Instant::now();
        let result = self
            .client
            .detect_labels()
            .image(image)
            .features(DetectLabelsFeatureName::ImageProperties)
            .send()
            .await;
        record_external_call("rekognition", "detect_labels", started, result.is_ok());

        let output = result.map_err(|e| ScorerError::Api(DisplayErrorContext(&e).to_string()))?;

        let quality = output
            .image_properties
            .and_then(|props| props.quality)
            .ok_or(ScorerError::MissingQuality)?;

        quality_score(quality.brightness, quality.sharpness, quality.contrast)
    }
}

/// Combine the three quality properties into one score.
fn quality_score(
    brightness: Option<f32>,
    sharpness: Option<f32>,
    contrast: Option<f32>,
) -> Result<f64, ScorerError> {
    match (brightness, sharpness, contrast) {
        (Some(b), Some(s), Some(c)) => Ok((b as f64 + s as f64 + c as f64).trunc()),
        _ => Err(ScorerError::MissingQuality),
    }
}
