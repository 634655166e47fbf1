//! Fleet event queue abstraction.
//!
//! Messages are pulled with long polling and must be acknowledged explicitly
//! once processed.

mod sqs;
mod types;

pub use sqs::SqsEventQueue;
pub use types::*;
