//! Fleet data model.
//!
//! Identifies monitored pipelines and decodes the lifecycle notifications the
//! fleet publishes when a pipeline group starts or stops.

mod event;
mod types;

pub use event::{EventDecodeError, FleetEvent};
pub use types::*;
