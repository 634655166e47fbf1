//! Pipeline monitoring.
//!
//! Keeps one sampling worker running per active pipeline:
//! - **Worker**: per-pipeline loop (sample -> score -> difference -> publish)
//! - **Registry**: the authoritative set of running workers, keyed by pipeline
//! - **Dispatcher**: translates fleet lifecycle events into registry start/stop

mod config;
mod dispatcher;
mod registry;
mod types;
mod worker;

pub use config::{DispatcherConfig, WorkerConfig};
pub use dispatcher::FleetEventDispatcher;
pub use registry::WorkerRegistry;
pub use types::{DispatchAction, IterationOutcome, StartOutcome, WorkerInfo};
pub use worker::{LoopState, MonitoringWorker, WorkerAdapters};
