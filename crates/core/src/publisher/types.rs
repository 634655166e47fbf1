//! Types for metric publishing.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fleet::PipelineKey;

/// Errors that can occur while publishing a metric.
#[derive(Debug, Clone, Error)]
pub enum PublishError {
    #[error("Invalid metric: {0}")]
    InvalidMetric(String),

    #[error("API error: {0}")]
    Api(String),
}

/// One timestamped difference value for a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub key: PipelineKey,
    pub value: f64,
    pub timestamp: DateTime<Utc>,
}

impl MetricPoint {
    /// Create a point stamped with the current time.
    pub fn now(key: PipelineKey, value: f64) -> Self {
        Self {
            key,
            value,
            timestamp: Utc::now(),
        }
    }
}

/// Trait for metric backends.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// Publish one metric point.
    ///
    /// Unlike sampling and scoring, a failure here is returned to the caller
    /// so it can decide whether to retry.
    async fn publish(&self, point: &MetricPoint) -> Result<(), PublishError>;
}
