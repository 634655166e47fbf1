//! Still-image sampling abstraction.
//!
//! This module provides a `Sampler` trait that fetches the current frame of a
//! pipeline's output as an encoded image.

mod medialive;
mod types;

pub use medialive::MediaLiveSampler;
pub use types::*;
