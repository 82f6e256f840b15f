//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::{IncrementalMode, RippleConfig};
use std::path::Path;

/// Name of the configuration file in the project root.
pub const CONFIG_FILE: &str = "ripple.toml";

/// Environment variable overriding `incremental.mode`.
pub const MODE_ENV_VAR: &str = "RIPPLE_INCREMENTAL";

/// Loads and validates `ripple.toml` from a project directory.
///
/// Reads `<project_dir>/ripple.toml`, parses it, applies the
/// `RIPPLE_INCREMENTAL` override, and validates the result.
pub fn load_config(project_dir: &Path) -> Result<RippleConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path).map_err(|source| ConfigError::Read {
        path: config_path.clone(),
        source,
    })?;
    let config = load_config_from_str(&content)?;
    apply_mode_override(config, std::env::var(MODE_ENV_VAR).ok().as_deref())
}

/// Like [`load_config`], but a missing file yields the default configuration.
pub fn load_config_or_default(project_dir: &Path) -> Result<RippleConfig, ConfigError> {
    if project_dir.join(CONFIG_FILE).exists() {
        load_config(project_dir)
    } else {
        apply_mode_override(
            RippleConfig::default(),
            std::env::var(MODE_ENV_VAR).ok().as_deref(),
        )
    }
}

/// Parses and validates a `ripple.toml` configuration from a string.
///
/// Does not consult the environment.
pub fn load_config_from_str(content: &str) -> Result<RippleConfig, ConfigError> {
    let config: RippleConfig = toml::from_str(content).map_err(|e| ConfigError::Parse {
        message: e.to_string(),
    })?;
    validate_config(&config)?;
    Ok(config)
}

/// Replaces the configured mode with an explicit override, if one is given.
fn apply_mode_override(
    mut config: RippleConfig,
    value: Option<&str>,
) -> Result<RippleConfig, ConfigError> {
    if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
        config.incremental.mode = value.parse::<IncrementalMode>()?;
    }
    Ok(config)
}

/// Validates that configuration values are consistent.
fn validate_config(config: &RippleConfig) -> Result<(), ConfigError> {
    if config.incremental.max_rounds == 0 {
        return Err(ConfigError::Validation {
            field: "incremental.max_rounds",
            reason: "must be at least 1".to_string(),
        });
    }
    if config.cache.dir.as_os_str().is_empty() {
        return Err(ConfigError::Validation {
            field: "cache.dir",
            reason: "must not be empty".to_string(),
        });
    }
    Ok(())
}
