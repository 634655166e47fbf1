//! Types for fleet inventory queries.

use async_trait::async_trait;
use thiserror::Error;

use crate::fleet::ActiveGroup;

/// Errors that can occur while listing the fleet.
#[derive(Debug, Clone, Error)]
pub enum InventoryError {
    #[error("API error: {0}")]
    Api(String),
}

/// Trait for fleet inventory backends.
#[async_trait]
pub trait FleetInventory: Send + Sync {
    /// Backend name for logging.
    fn name(&self) -> &str;

    /// List every pipeline group in an active (RUNNING or STARTING) state.
    async fn active_groups(&self) -> Result<Vec<ActiveGroup>, InventoryError>;
}
