use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub monitor: MonitorConfig,
    pub queue: QueueConfig,
    #[serde(default)]
    pub reconcile: ReconcileConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub aws: AwsConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Per-pipeline sampling configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MonitorConfig {
    /// Metrics namespace the difference metric is published under
    pub namespace: String,
    /// Sampling interval in seconds
    pub interval_secs: u64,
    /// Extra publish attempts after a failed publish (0 = no retry)
    #[serde(default = "default_publish_retries")]
    pub publish_retries: u32,
    /// Delay between publish attempts in milliseconds
    #[serde(default = "default_publish_retry_delay")]
    pub publish_retry_delay_ms: u64,
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

fn default_publish_retries() -> u32 {
    2
}

fn default_publish_retry_delay() -> u64 {
    500
}

/// Fleet event queue configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueueConfig {
    /// Queue name
    pub name: String,
    /// Long-poll wait per receive call in seconds (max 20)
    #[serde(default = "default_wait_time")]
    pub wait_time_secs: u32,
    /// Maximum messages per receive call (1-10)
    #[serde(default = "default_max_messages")]
    pub max_messages: u32,
    /// Pause after a failed receive before retrying, in milliseconds
    #[serde(default)]
    pub receive_error_backoff_ms: u64,
}

fn default_wait_time() -> u32 {
    20
}

fn default_max_messages() -> u32 {
    10
}

/// Startup reconciliation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReconcileConfig {
    /// Start workers for already-active pipelines at startup
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Spread the initial worker starts over the sampling interval
    #[serde(default = "default_true")]
    pub stagger: bool,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            stagger: true,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Logging configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Enable debug-level logging
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// AWS client configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AwsConfig {
    /// Region override (defaults to the SDK provider chain)
    #[serde(default)]
    pub region: Option<String>,
}

/// Status server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}
