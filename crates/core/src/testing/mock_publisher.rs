//! Mock publisher for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::fleet::PipelineKey;
use crate::publisher::{MetricPoint, PublishError, Publisher};

/// Mock implementation of the Publisher trait.
///
/// Records every accepted point and every attempt, and can be told to fail.
#[derive(Debug)]
pub struct MockPublisher {
    /// Points that were accepted.
    published: Arc<RwLock<Vec<MetricPoint>>>,
    /// Total publish calls, including failed ones.
    attempts: Arc<RwLock<usize>>,
    /// If set, the next call fails with this error.
    next_error: Arc<RwLock<Option<PublishError>>>,
    /// Number of upcoming calls that fail with a generic error.
    failures_remaining: Arc<RwLock<u32>>,
}

impl Default for MockPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPublisher {
    /// Create a new mock publisher.
    pub fn new() -> Self {
        Self {
            published: Arc::new(RwLock::new(Vec::new())),
            attempts: Arc::new(RwLock::new(0)),
            next_error: Arc::new(RwLock::new(None)),
            failures_remaining: Arc::new(RwLock::new(0)),
        }
    }

    /// Get all accepted points.
    pub async fn published(&self) -> Vec<MetricPoint> {
        self.published.read().await.clone()
    }

    /// Get accepted values for one pipeline, in order.
    pub async fn values_for(&self, key: &PipelineKey) -> Vec<f64> {
        self.published
            .read()
            .await
            .iter()
            .filter(|p| &p.key == key)
            .map(|p| p.value)
            .collect()
    }

    /// Get the number of accepted points.
    pub async fn publish_count(&self) -> usize {
        self.published.read().await.len()
    }

    /// Get the number of publish calls, successful or not.
    pub async fn attempt_count(&self) -> usize {
        *self.attempts.read().await
    }

    /// Configure the next call to fail with the given error.
    pub async fn set_next_error(&self, error: PublishError) {
        *self.next_error.write().await = Some(error);
    }

    /// Fail the next `count` calls.
    pub async fn fail_next(&self, count: u32) {
        *self.failures_remaining.write().await = count;
    }

    /// Clear recorded points and pending failures.
    pub async fn reset(&self) {
        self.published.write().await.clear();
        *self.attempts.write().await = 0;
        *self.next_error.write().await = None;
        *self.failures_remaining.write().await = 0;
    }
}

#[async_trait]
impl Publisher for MockPublisher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn publish(&self, point: &MetricPoint) -> Result<(), PublishError> {
        *self.attempts.write().await += 1;

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        {
            let mut remaining = self.failures_remaining.write().await;
            if *remaining > 0 {
                *remaining -= 1;
                return Err(PublishError::Api("mock publish failure".to_string()));
            }
        }

        self.published.write().await.push(point.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_failure_injection_order() {
        let publisher = MockPublisher::new();
        let point = MetricPoint::now(fixtures::key("1", 0), 3.0);
        publisher
            .set_next_error(PublishError::InvalidMetric("bad".to_string()))
            .await;
        publisher.fail_next(1).await;

        assert!(matches!(
            publisher.publish(&point).await,
            Err(PublishError::InvalidMetric(_))
        ));
        assert!(matches!(
            publisher.publish(&point).await,
            Err(PublishError::Api(_))
        ));
        assert!(publisher.publish(&point).await.is_ok());

        assert_eq!(publisher.attempt_count().await, 3);
        assert_eq!(publisher.values_for(&fixtures::key("1", 0)).await, vec![3.0]);
    }

    #[tokio::test]
    async fn test_reset_clears_points_and_pending_failures() {
        let publisher = MockPublisher::new();
        let point = MetricPoint::now(fixtures::key("1", 1), 5.0);
        assert!(publisher.publish(&point).await.is_ok());
        publisher.fail_next(3).await;
        publisher
            .set_next_error(PublishError::Api("down".to_string()))
            .await;

        publisher.reset().await;

        assert_eq!(publisher.publish_count().await, 0);
        assert_eq!(publisher.attempt_count().await, 0);
        assert!(publisher.publish(&point).await.is_ok());
        assert_eq!(publisher.values_for(&fixtures::key("1", 1)).await, vec![5.0]);
    }
}
