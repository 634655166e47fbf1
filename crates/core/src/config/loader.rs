use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;

use super::{types::Config, ConfigError};

/// Prefix for environment overrides, e.g. `FRAMEWATCH_MONITOR__INTERVAL_SECS`
const ENV_PREFIX: &str = "FRAMEWATCH_";

/// Legacy container variables, still honoured
const LEGACY_NAMESPACE_VAR: &str = "METRIC_NAMESPACE";
const LEGACY_INTERVAL_VAR: &str = "DETECTION_INTERVAL";
const LEGACY_QUEUE_VAR: &str = "SQS_QUEUE_NAME";

/// Presence of this variable (any value) enables debug logging
const DEBUG_FLAG_VAR: &str = "ENABLE_DEBUG";

/// Load configuration from file with environment variable overrides
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    extract(Figment::new().merge(Toml::file(path)))
}

/// Load configuration from environment variables only
pub fn load_config_from_env() -> Result<Config, ConfigError> {
    extract(Figment::new())
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}

fn extract(figment: Figment) -> Result<Config, ConfigError> {
    let mut config: Config = figment
        .merge(legacy_env())
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    if std::env::var_os(DEBUG_FLAG_VAR).is_some() {
        config.logging.debug = true;
    }

    Ok(config)
}

fn legacy_env() -> Env {
    Env::raw()
        .only(&[LEGACY_NAMESPACE_VAR, LEGACY_INTERVAL_VAR, LEGACY_QUEUE_VAR])
        .map(|key| {
            if key == LEGACY_NAMESPACE_VAR {
                "monitor.namespace".into()
            } else if key == LEGACY_INTERVAL_VAR {
                "monitor.interval_secs".into()
            } else {
                "queue.name".into()
            }
        })
}
