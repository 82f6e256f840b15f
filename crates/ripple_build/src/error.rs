//! Error types for incremental builds.

use std::path::PathBuf;

use ripple_cache::CacheError;
use ripple_common::InternalError;
use ripple_lookup::LookupError;

/// Errors that abort an incremental build.
///
/// Compilation errors in user code are not among them: they are reported
/// through the build summary and only gate cache cleanup.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// A target cache could not be opened, updated, or written.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// The lookup index could not be opened, updated, or written.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    /// A component was used against its contract.
    #[error(transparent)]
    Internal(#[from] InternalError),

    /// The targets handed to the build contradict each other.
    #[error("invalid build model: {reason}")]
    InvalidModel {
        /// What is wrong with the model.
        reason: String,
    },

    /// The module file for the compiler could not be written.
    #[error("cannot write module file {path}: {source}")]
    ModuleFile {
        /// The module file path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The module descriptors could not be serialized.
    #[error("cannot serialize module descriptors: {reason}")]
    Serialization {
        /// Description of the failure.
        reason: String,
    },

    /// The cancellation status was raised during the build.
    #[error("build cancelled")]
    Cancelled,
}
