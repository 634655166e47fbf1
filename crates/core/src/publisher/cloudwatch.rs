//! CloudWatch metric publisher.

use std::time::Instant;

use async_trait::async_trait;
use aws_sdk_cloudwatch::error::DisplayErrorContext;
use aws_sdk_cloudwatch::primitives::DateTime;
use aws_sdk_cloudwatch::types::{Dimension, MetricDatum, StandardUnit};
use aws_sdk_cloudwatch::Client;
use tracing::{debug, error};

use crate::metrics::record_external_call;

use super::{MetricPoint, PublishError, Publisher};

/// Name of the single measurement this service publishes.
pub const METRIC_NAME: &str = "ImageProperties";

const GROUP_DIMENSION: &str = "ChannelId";
const PIPELINE_DIMENSION: &str = "Pipeline";

/// High-resolution (1 second) storage.
const STORAGE_RESOLUTION_SECS: i32 = 1;

/// Publishes difference metrics with `PutMetricData`.
#[derive(Debug, Clone)]
pub struct CloudWatchPublisher {
    client: Client,
    namespace: String,
}

impl CloudWatchPublisher {
    pub fn new(client: Client, namespace: impl Into<String>) -> Self {
        Self {
            client,
            namespace: namespace.into(),
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn build_datum(point: &MetricPoint) -> Result<MetricDatum, PublishError> {
        if !point.value.is_finite() {
            return Err(PublishError::InvalidMetric(format!(
                "non-finite value {}",
                point.value
            )));
        }

        let group = Dimension::builder()
            .name(GROUP_DIMENSION)
            .value(point.key.group.as_str())
            .build();
        let pipeline = Dimension::builder()
            .name(PIPELINE_DIMENSION)
            .value(point.key.pipeline.to_string())
            .build();

        Ok(MetricDatum::builder()
            .metric_name(METRIC_NAME)
            .value(point.value)
            .unit(StandardUnit::None)
            .storage_resolution(STORAGE_RESOLUTION_SECS)
            .timestamp(DateTime::from_millis(point.timestamp.timestamp_millis()))
            .dimensions(group)
            .dimensions(pipeline)
            .build())
    }
}

#[async_trait]
impl Publisher for CloudWatchPublisher {
    fn name(&self) -> &str {
        "cloudwatch"
    }

    async fn publish(&self, point: &MetricPoint) -> Result<(), PublishError> {
        let datum = Self::build_datum(point)?;

        let started = Instant::now();
        let result = self
            .client
            .put_metric_data()
            .namespace(&self.namespace)
            .metric_data(datum)
            .send()
            .await;
        record_external_call("cloudwatch", "put_metric_data", started, result.is_ok());

        match result {
            Ok(_) => {
                debug!(
                    group = %point.key.group,
                    pipeline = point.key.pipeline,
                    value = point.value,
                    "Metric published"
                );
                Ok(())
            }
            Err(e) => {
                let message = DisplayErrorContext(&e).to_string();
                error!(
                    group = %point.key.group,
                    pipeline = point.key.pipeline,
                    error = %message,
                    "Error posting metric to CloudWatch"
                );
                Err(PublishError::Api(message))
            }
        }
    }
}
