use std::sync::Arc;

use framewatch_core::{Config, WorkerRegistry};

/// Shared state for the status server
pub struct AppState {
    config: Config,
    registry: Arc<WorkerRegistry>,
}

impl AppState {
    pub fn new(config: Config, registry: Arc<WorkerRegistry>) -> Self {
        Self { config, registry }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &WorkerRegistry {
        &self.registry
    }
}
