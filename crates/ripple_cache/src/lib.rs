//! Per-target incremental compilation caches.
//!
//! This crate persists, for every compilation target, which outputs each
//! source produced and the member surface of every compiled class, diffs new
//! class artifacts against that state to produce [`ChangeInfo`] values, and
//! wires the caches of a build along the target dependency graph so that
//! changes in one target are visible to the targets that depend on it.

#![warn(missing_docs)]

pub mod artifact;
pub mod cache;
pub mod change;
pub mod error;
pub mod frame;
pub mod generated;
pub mod hasher;
pub mod lock;
pub mod manifest;
pub mod snapshot;
pub mod targets;

pub use artifact::{BinaryVersion, ClassArtifact, ClassKind, ClassMetadata, MemberKind, MemberSignature};
pub use cache::IncrementalCache;
pub use change::{ChangeInfo, CompilationResult};
pub use error::{ArtifactLoadError, CacheError};
pub use generated::{GeneratedClass, GeneratedFile, GeneratedOutput};
pub use hasher::{SourceChanges, SourceHasher};
pub use lock::CacheLock;
pub use snapshot::ClassSnapshot;
pub use targets::{incremental_caches, IncrementalCaches, TargetGraph};
