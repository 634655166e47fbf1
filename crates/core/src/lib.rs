pub mod config;
pub mod fleet;
pub mod inventory;
pub mod metrics;
pub mod monitor;
pub mod publisher;
pub mod queue;
pub mod sampler;
pub mod scorer;
pub mod testing;

pub use config::{
    load_config, load_config_from_env, load_config_from_str, validate_config, Config,
    ConfigError,
};
pub use fleet::{ActiveGroup, EventDecodeError, FleetEvent, GroupId, LifecycleState, PipelineKey};
pub use monitor::{
    DispatchAction, DispatcherConfig, FleetEventDispatcher, IterationOutcome, LoopState,
    MonitoringWorker, StartOutcome, WorkerAdapters, WorkerConfig, WorkerInfo, WorkerRegistry,
};
