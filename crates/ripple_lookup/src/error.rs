//! Error types for the lookup index.

use std::path::PathBuf;

use ripple_cache::CacheError;
use ripple_common::InternalError;

/// Errors that can occur while reading, updating, or writing the lookup index.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The index file could not be read.
    #[error("cannot read lookup index {path}: {source}")]
    Io {
        /// The index path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The index file exists but is damaged.
    #[error("lookup index {path} is corrupt: {reason}")]
    Corrupt {
        /// The index path.
        path: PathBuf,
        /// Description of the damage.
        reason: String,
    },

    /// Locking, encoding, or writing through the cache layer failed.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// A caller broke the index's usage contract.
    #[error(transparent)]
    Internal(#[from] InternalError),
}
