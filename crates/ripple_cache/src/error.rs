//! Failures of the per-target caches and of artifact loading.

use std::path::PathBuf;

use ripple_common::{InternalError, TargetId};

use crate::artifact::BinaryVersion;

/// A cache that could not be opened, read, or written.
///
/// Only a format-version mismatch is recovered from (by wiping the cache).
/// Every other problem with persisted state is reported, because guessing
/// "no changes" for an unreadable snapshot could ship stale artifacts.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Reading or writing a file under the cache directory failed.
    #[error("{}: {source}", path.display())]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// OS error.
        source: std::io::Error,
    },

    /// `manifest.json` is not a valid manifest.
    #[error("unreadable manifest {}: {reason}", path.display())]
    ManifestParse {
        /// Manifest location.
        path: PathBuf,
        /// Parser message.
        reason: String,
    },

    /// A framed binary file does not start with the expected header.
    #[error("bad frame header in {}: {reason}", path.display())]
    InvalidHeader {
        /// Framed file.
        path: PathBuf,
        /// Which header field is wrong.
        reason: String,
    },

    /// The payload of a framed file does not hash to its recorded checksum.
    #[error("{} is corrupt (checksum {actual}, recorded {expected})", path.display())]
    ChecksumMismatch {
        /// Framed file.
        path: PathBuf,
        /// Checksum in the header.
        expected: String,
        /// Checksum of the payload as read.
        actual: String,
    },

    /// Encoding or decoding a payload failed.
    #[error("cannot encode cache data: {reason}")]
    Serialization {
        /// Codec message.
        reason: String,
    },

    /// Another process holds the cache directory.
    #[error("cache at {path} is locked by another build")]
    Locked {
        /// The lock file path.
        path: PathBuf,
    },

    /// Persisted tables contradict each other.
    #[error("cache for {target} is inconsistent: {reason}")]
    Inconsistent {
        /// Owning target of the cache.
        target: TargetId,
        /// Description of the inconsistency.
        reason: String,
    },

    /// The target dependency graph contains a cycle.
    #[error("dependency cycle involving target {target}")]
    DependencyCycle {
        /// A target on the cycle.
        target: TargetId,
    },

    /// A generated artifact could not be loaded.
    #[error(transparent)]
    ArtifactLoad(#[from] ArtifactLoadError),

    /// A caller broke the cache's usage contract.
    #[error(transparent)]
    Internal(#[from] InternalError),
}

/// Errors raised while loading a generated class artifact.
///
/// Each one fails the pass for that file: without valid metadata no diff
/// against the previous snapshot can be computed.
#[derive(Debug, thiserror::Error)]
pub enum ArtifactLoadError {
    /// The artifact could not be read.
    #[error("cannot read artifact {path}: {source}")]
    Io {
        /// The artifact path.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// The artifact carries no recognized metadata section.
    #[error("artifact {path} has no valid class metadata: {reason}")]
    MissingMetadata {
        /// The artifact path.
        path: PathBuf,
        /// What was missing or malformed.
        reason: String,
    },

    /// The metadata section is present but damaged.
    #[error("artifact {path} has corrupt class metadata: {reason}")]
    Corrupt {
        /// The artifact path.
        path: PathBuf,
        /// Description of the damage.
        reason: String,
    },

    /// The metadata was written by an incompatible compiler.
    #[error("artifact {path} has incompatible binary version {found} (expected {expected})")]
    IncompatibleVersion {
        /// The artifact path.
        path: PathBuf,
        /// Version found in the artifact.
        found: BinaryVersion,
        /// Version this tool reads.
        expected: BinaryVersion,
    },
}

impl CacheError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CacheError::Io {
            path: path.into(),
            source,
        }
    }
}
