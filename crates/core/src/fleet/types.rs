//! Core identifiers for monitored pipelines.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while parsing fleet identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FleetIdError {
    #[error("Malformed resource ARN: {0}")]
    MalformedArn(String),

    #[error("Empty group identifier")]
    EmptyGroupId,
}

/// Opaque identifier of a pipeline group (one stream source).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Create a group id, rejecting empty identifiers.
    pub fn new(id: impl Into<String>) -> Result<Self, FleetIdError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() {
            return Err(FleetIdError::EmptyGroupId);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Extract the group id from a resource ARN.
    ///
    /// The id is the seventh `:`-separated field, e.g.
    /// `arn:aws:medialive:us-west-2:123456789012:channel:8675309`.
    pub fn from_arn(arn: &str) -> Result<Self, FleetIdError> {
        let id = arn
            .split(':')
            .nth(6)
            .ok_or_else(|| FleetIdError::MalformedArn(arn.to_string()))?;
        Self::new(id).map_err(|_| FleetIdError::MalformedArn(arn.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies one monitored unit: a single pipeline within a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PipelineKey {
    /// Parent pipeline group.
    pub group: GroupId,
    /// Pipeline index within the group (usually 0 or 1).
    pub pipeline: u32,
}

impl PipelineKey {
    pub fn new(group: GroupId, pipeline: u32) -> Self {
        Self { group, pipeline }
    }

    /// Key for another pipeline of the same group.
    pub fn sibling(&self, pipeline: u32) -> Self {
        Self {
            group: self.group.clone(),
            pipeline,
        }
    }
}

impl fmt::Display for PipelineKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.pipeline)
    }
}

/// Fleet-reported lifecycle state of a pipeline group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Starting,
    Running,
    Stopping,
    Stopped,
    /// Any state this service does not act on (e.g. CREATING, IDLE).
    Other(String),
}

impl LifecycleState {
    /// Parse the upstream upper-case state string.
    pub fn parse(s: &str) -> Self {
        match s {
            "STARTING" => LifecycleState::Starting,
            "RUNNING" => LifecycleState::Running,
            "STOPPING" => LifecycleState::Stopping,
            "STOPPED" => LifecycleState::Stopped,
            other => LifecycleState::Other(other.to_string()),
        }
    }

    /// States in which a pipeline should be monitored.
    pub fn is_active(&self) -> bool {
        matches!(self, LifecycleState::Starting | LifecycleState::Running)
    }

    /// States in which monitoring should be torn down.
    pub fn is_inactive(&self) -> bool {
        matches!(self, LifecycleState::Stopping | LifecycleState::Stopped)
    }

    pub fn as_str(&self) -> &str {
        match self {
            LifecycleState::Starting => "STARTING",
            LifecycleState::Running => "RUNNING",
            LifecycleState::Stopping => "STOPPING",
            LifecycleState::Stopped => "STOPPED",
            LifecycleState::Other(s) => s,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pipeline group reported active by the fleet inventory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveGroup {
    pub group: GroupId,
    /// Number of pipelines currently running in the group.
    pub pipelines_running: u32,
}

impl ActiveGroup {
    /// Keys for every running pipeline, index 0 upwards.
    pub fn pipeline_keys(&self) -> impl Iterator<Item = PipelineKey> + '_ {
        (0..self.pipelines_running).map(|idx| PipelineKey::new(self.group.clone(), idx))
    }
}
