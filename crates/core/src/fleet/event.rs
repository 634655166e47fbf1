//! Decoding of fleet lifecycle notifications.

use serde::Deserialize;
use thiserror::Error;

use super::types::{FleetIdError, GroupId, LifecycleState, PipelineKey};

/// Errors that can occur while decoding a queue message into a [`FleetEvent`].
#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("Invalid event JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Event has no resource identifier")]
    MissingResource,

    #[error("Invalid resource identifier: {0}")]
    InvalidResource(#[from] FleetIdError),

    #[error("Invalid pipeline index: {0}")]
    InvalidPipeline(String),
}

/// One lifecycle notification for a single pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FleetEvent {
    pub key: PipelineKey,
    pub state: LifecycleState,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    #[serde(default)]
    resources: Vec<String>,
    detail: RawDetail,
}

#[derive(Debug, Deserialize)]
struct RawDetail {
    state: String,
    pipeline: RawPipeline,
}

/// The pipeline index arrives as a string in state-change events, but
/// accept a bare number as well.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPipeline {
    Number(i64),
    Text(String),
}

impl RawPipeline {
    fn to_index(&self) -> Result<u32, EventDecodeError> {
        match self {
            RawPipeline::Number(n) => {
                u32::try_from(*n).map_err(|_| EventDecodeError::InvalidPipeline(n.to_string()))
            }
            RawPipeline::Text(s) => s
                .trim()
                .parse::<u32>()
                .map_err(|_| EventDecodeError::InvalidPipeline(s.clone())),
        }
    }
}

impl FleetEvent {
    /// Decode a state-change notification from a queue message body.
    pub fn from_json(body: &str) -> Result<Self, EventDecodeError> {
        let raw: RawEvent = serde_json::from_str(body)?;

        let arn = raw
            .resources
            .first()
            .ok_or(EventDecodeError::MissingResource)?;
        let group = GroupId::from_arn(arn)?;
        let pipeline = raw.detail.pipeline.to_index()?;

        Ok(Self {
            key: PipelineKey::new(group, pipeline),
            state: LifecycleState::parse(&raw.detail.state),
        })
    }
}
