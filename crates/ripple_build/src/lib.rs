//! Incremental build driver.
//!
//! This crate connects the per-target caches and the lookup index to an
//! external [`Compiler`]: it hands the compiler module descriptors, assigns
//! the reported outputs to targets, saves them into the caches, and decides
//! which files the next round must recompile until nothing changes.

#![warn(missing_docs)]

pub mod compiler;
pub mod descriptor;
pub mod dirty;
pub mod error;
pub mod model;
pub mod output;
pub mod session;
pub mod update;

pub use compiler::{
    CancellationStatus, CancellationToken, CompilationEnvironment, Compiler, ExitCode, NeverCancelled,
    OutputItem, OutputItemsCollector,
};
pub use descriptor::{java_source_roots, ModuleDescriptor, ModuleFile};
pub use dirty::dirty_files;
pub use error::BuildError;
pub use model::{BuildModel, ModuleTarget};
pub use output::generated_files;
pub use session::{clean, BuildOptions, BuildSummary, IncrementalBuild};
pub use update::update_incremental_cache;
