//! Fleet inventory abstraction, queried once at startup to find the
//! pipeline groups that are already running.

mod medialive;
mod types;

pub use medialive::MediaLiveInventory;
pub use types::*;
