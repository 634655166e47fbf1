//! Runtime settings for workers and the dispatcher.

use std::time::Duration;

use crate::config::{Config, MonitorConfig};

/// Settings shared by every monitoring worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Target time from the start of one iteration to the start of the next.
    pub interval: Duration,
    /// Extra publish attempts after a failure.
    pub publish_retries: u32,
    /// Pause between publish attempts.
    pub publish_retry_delay: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            publish_retries: 2,
            publish_retry_delay: Duration::from_millis(500),
        }
    }
}

impl From<&MonitorConfig> for WorkerConfig {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            interval: config.interval(),
            publish_retries: config.publish_retries,
            publish_retry_delay: Duration::from_millis(config.publish_retry_delay_ms),
        }
    }
}

/// Settings for the fleet event dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Sampling interval; bounds the random stagger between startup starts.
    pub interval: Duration,
    /// Insert a random delay between consecutive startup starts.
    pub stagger: bool,
    /// Pause after a failed receive before trying again.
    pub receive_error_backoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(10),
            stagger: true,
            receive_error_backoff: Duration::ZERO,
        }
    }
}

impl From<&Config> for DispatcherConfig {
    fn from(config: &Config) -> Self {
        Self {
            interval: config.monitor.interval(),
            stagger: config.reconcile.stagger,
            receive_error_backoff: Duration::from_millis(config.queue.receive_error_backoff_ms),
        }
    }
}
