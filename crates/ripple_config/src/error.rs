//! Errors raised while reading `ripple.toml`.

use std::path::PathBuf;

/// A configuration that could not be read, parsed, or accepted.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("cannot read {}: {source}", path.display())]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The content is not valid TOML for the configuration schema.
    #[error("malformed configuration: {message}")]
    Parse {
        /// Parser message, including the location.
        message: String,
    },

    /// A mode name that is none of `disabled`, `enabled`, `experimental`.
    #[error("unknown incremental mode `{value}`")]
    InvalidMode {
        /// The rejected value.
        value: String,
    },

    /// A well-formed value outside its allowed range.
    #[error("invalid `{field}`: {reason}")]
    Validation {
        /// Dotted key of the offending value.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}
