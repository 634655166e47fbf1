//! Image quality scoring abstraction.

mod rekognition;
mod types;

pub use rekognition::RekognitionScorer;
pub use types::*;
