//! Mock fleet inventory for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::fleet::ActiveGroup;
use crate::inventory::{FleetInventory, InventoryError};

/// Mock implementation of the FleetInventory trait.
#[derive(Debug)]
pub struct MockInventory {
    groups: Arc<RwLock<Vec<ActiveGroup>>>,
    fail: Arc<RwLock<bool>>,
    calls: Arc<RwLock<usize>>,
}

impl Default for MockInventory {
    fn default() -> Self {
        Self::new()
    }
}

impl MockInventory {
    /// Create an inventory with no active groups.
    pub fn new() -> Self {
        Self {
            groups: Arc::new(RwLock::new(Vec::new())),
            fail: Arc::new(RwLock::new(false)),
            calls: Arc::new(RwLock::new(0)),
        }
    }

    /// Create an inventory reporting the given groups.
    pub fn with_groups(groups: Vec<ActiveGroup>) -> Self {
        Self {
            groups: Arc::new(RwLock::new(groups)),
            ..Self::new()
        }
    }

    /// Replace the reported groups.
    pub async fn set_groups(&self, groups: Vec<ActiveGroup>) {
        *self.groups.write().await = groups;
    }

    /// Make listing fail.
    pub async fn set_failure(&self, fail: bool) {
        *self.fail.write().await = fail;
    }

    /// Get the number of list calls.
    pub async fn call_count(&self) -> usize {
        *self.calls.read().await
    }
}

#[async_trait]
impl FleetInventory for MockInventory {
    fn name(&self) -> &str {
        "mock"
    }

    async fn active_groups(&self) -> Result<Vec<ActiveGroup>, InventoryError> {
        *self.calls.write().await += 1;

        if *self.fail.read().await {
            return Err(InventoryError::Api("mock inventory failure".to_string()));
        }
        Ok(self.groups.read().await.clone())
    }
}
