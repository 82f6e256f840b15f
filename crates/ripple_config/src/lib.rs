//! Parsing and validation of `ripple.toml` incremental build configuration.
//!
//! This crate reads the project configuration file and produces a strongly-typed
//! [`RippleConfig`] selecting the incremental mode, the round limit of the
//! recompilation loop, and the location of the persistent caches.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{load_config, load_config_from_str, load_config_or_default, CONFIG_FILE, MODE_ENV_VAR};
pub use types::*;
