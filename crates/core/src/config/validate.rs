use super::{types::Config, ConfigError};

/// Longest long-poll wait the queue backend accepts
const MAX_WAIT_TIME_SECS: u32 = 20;

/// Largest receive batch the queue backend accepts
const MAX_BATCH: u32 = 10;

/// Validate configuration
/// Currently validates:
/// - Required sections exist (enforced by serde)
/// - Namespace and queue name are not blank
/// - Sampling interval is positive
/// - Queue receive settings are within backend limits
/// - Server port is not 0 when the server is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.monitor.namespace.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "monitor.namespace cannot be empty".to_string(),
        ));
    }

    if config.monitor.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "monitor.interval_secs must be positive".to_string(),
        ));
    }

    if config.queue.name.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "queue.name cannot be empty".to_string(),
        ));
    }

    if config.queue.wait_time_secs > MAX_WAIT_TIME_SECS {
        return Err(ConfigError::ValidationError(format!(
            "queue.wait_time_secs cannot exceed {}",
            MAX_WAIT_TIME_SECS
        )));
    }

    if config.queue.max_messages == 0 || config.queue.max_messages > MAX_BATCH {
        return Err(ConfigError::ValidationError(format!(
            "queue.max_messages must be between 1 and {}",
            MAX_BATCH
        )));
    }

    if config.server.enabled && config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}
