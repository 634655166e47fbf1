//! MediaLive thumbnail sampler.

use std::time::Instant;

use async_trait::async_trait;
use aws_sdk_medialive::error::DisplayErrorContext;
use aws_sdk_medialive::Client;
use base64::Engine;
use tracing::debug;

use crate::fleet::PipelineKey;
use crate::metrics::record_external_call;

use super::{ImageSample, Sampler, SamplerError};

/// Thumbnail type holding the frame currently being encoded.
const THUMBNAIL_TYPE: &str = "CURRENT_ACTIVE";

/// Samples pipelines through the MediaLive `DescribeThumbnails` API.
#[derive(Debug, Clone)]
pub struct MediaLiveSampler {
    client: Client,
}

impl MediaLiveSampler {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Sampler for MediaLiveSampler {
    fn name(&self) -> &str {
        "medialive"
    }

    async fn sample(&self, key: &PipelineKey) -> Result<ImageSample, SamplerError> {
        let started = Instant::now();
        let result = self
            .client
            .describe_thumbnails()
            .channel_id(key.group.as_str())
            .pipeline_id(key.pipeline.to_string())
            .thumbnail_type(THUMBNAIL_TYPE)
            .send()
            .await;
        record_external_call("medialive", "describe_thumbnails", started, result.is_ok());

        let output = result.map_err(|e| SamplerError::Api(DisplayErrorContext(&e).to_string()))?;

        let body = output
            .thumbnail_details
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|detail| detail.thumbnails)
            .and_then(|thumbnails| thumbnails.into_iter().next())
            .and_then(|thumbnail| thumbnail.body);

        let sample = decode_thumbnail(body)?;
        debug!(
            group = %key.group,
            pipeline = key.pipeline,
            bytes = sample.len(),
            "Thumbnail fetched"
        );
        Ok(sample)
    }
}

/// Decode a base64 thumbnail body into raw image bytes.
fn decode_thumbnail(body: Option<String>) -> Result<ImageSample, SamplerError> {
    let body = body.filter(|b| !b.is_empty()).ok_or(SamplerError::Empty)?;
    let data = base64::engine::general_purpose::STANDARD
        .decode(body.as_bytes())
        .map_err(|e| SamplerError::Decode(e.to_string()))?;
    if data.is_empty() {
        return Err(SamplerError::Empty);
    }
    Ok(ImageSample::new(data))
}
