//! Metric publishing abstraction.

mod cloudwatch;
mod types;

pub use cloudwatch::{CloudWatchPublisher, METRIC_NAME};
pub use types::*;
