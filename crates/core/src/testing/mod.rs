//! Testing utilities and mock implementations.
//!
//! Every external service trait has a mock here, so workers, the registry and
//! the dispatcher can be exercised without AWS.
//!
//! # Example
//!
//! ```rust,ignore
//! use framewatch_core::testing::{fixtures, MockPublisher, MockSampler, MockScorer};
//!
//! let scorer = MockScorer::new();
//! scorer.push_scores(&[42.0, 50.0]).await;
//!
//! // Run two iterations, then
//! assert_eq!(publisher.values_for(&fixtures::key("C", 0)).await, vec![8.0]);
//! ```

mod mock_event_queue;
mod mock_inventory;
mod mock_publisher;
mod mock_sampler;
mod mock_scorer;

pub use mock_event_queue::MockEventQueue;
pub use mock_inventory::MockInventory;
pub use mock_publisher::MockPublisher;
pub use mock_sampler::MockSampler;
pub use mock_scorer::MockScorer;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::fleet::{ActiveGroup, GroupId, PipelineKey};
    use crate::sampler::ImageSample;

    /// Region and account used in fixture ARNs.
    pub const ARN_PREFIX: &str = "arn:aws:medialive:us-west-2:123456789012:channel";

    /// Build a group id.
    ///
    /// # Panics
    ///
    /// Panics if `group` is blank.
    pub fn group(group: &str) -> GroupId {
        GroupId::new(group).expect("fixture group id must not be blank")
    }

    /// Build a pipeline key.
    pub fn key(group_id: &str, pipeline: u32) -> PipelineKey {
        PipelineKey::new(group(group_id), pipeline)
    }

    /// An inventory entry with the given number of running pipelines.
    pub fn active_group(group_id: &str, pipelines_running: u32) -> ActiveGroup {
        ActiveGroup {
            group: group(group_id),
            pipelines_running,
        }
    }

    /// Resource ARN for a group.
    pub fn channel_arn(group_id: &str) -> String {
        format!("{}:{}", ARN_PREFIX, group_id)
    }

    /// A channel state-change notification body as delivered by the queue.
    pub fn state_change_event(group_id: &str, state: &str, pipeline: u32) -> String {
        serde_json::json!({
            "version": "0",
            "detail-type": "MediaLive Channel State Change",
            "source": "aws.medialive",
            "region": "us-west-2",
            "resources": [channel_arn(group_id)],
            "detail": {
                "channel_arn": channel_arn(group_id),
                "state": state,
                "message": format!("Channel is {}", state.to_lowercase()),
                "pipeline": pipeline.to_string(),
            }
        })
        .to_string()
    }

    /// A tiny JPEG-like image sample.
    pub fn sample() -> ImageSample {
        ImageSample::new(vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, 0xff, 0xd9])
    }
}
