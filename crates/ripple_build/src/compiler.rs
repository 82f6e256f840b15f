//! The boundary between the incremental core and the external compiler.

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ripple_cache::IncrementalCaches;
use ripple_lookup::LookupTracker;

use crate::descriptor::ModuleFile;

/// One output reported by the compiler with the sources it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputItem {
    /// Sources that produced the output.
    pub source_files: BTreeSet<PathBuf>,
    /// The output file.
    pub output_file: PathBuf,
}

/// Collects the outputs of one compiler invocation, in report order.
#[derive(Debug, Clone, Default)]
pub struct OutputItemsCollector {
    items: Vec<OutputItem>,
}

impl OutputItemsCollector {
    /// Creates an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `sources` produced `output`.
    pub fn add<I>(&mut self, sources: I, output: impl Into<PathBuf>)
    where
        I: IntoIterator,
        I::Item: Into<PathBuf>,
    {
        self.items.push(OutputItem {
            source_files: sources.into_iter().map(Into::into).collect(),
            output_file: output.into(),
        });
    }

    /// Collected outputs.
    pub fn outputs(&self) -> &[OutputItem] {
        &self.items
    }

    /// Number of collected outputs.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Returns `true` if nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// How a compiler invocation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Compiled without errors.
    Ok,
    /// The sources had errors.
    CompilationError,
    /// The compiler itself failed.
    InternalError,
}

impl ExitCode {
    /// Returns `true` for [`ExitCode::Ok`].
    pub fn is_ok(self) -> bool {
        self == ExitCode::Ok
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Ok => write!(f, "ok"),
            ExitCode::CompilationError => write!(f, "compilation error"),
            ExitCode::InternalError => write!(f, "internal error"),
        }
    }
}

/// External cancellation signal polled by the build and the compiler.
pub trait CancellationStatus {
    /// Returns `true` once the build should stop.
    fn is_canceled(&self) -> bool;
}

/// A cancellation status that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancelled;

impl CancellationStatus for NeverCancelled {
    fn is_canceled(&self) -> bool {
        false
    }
}

/// Shared flag that can be raised from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raises the flag.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl CancellationStatus for CancellationToken {
    fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Collaborators the compiler sees during one invocation.
pub struct CompilationEnvironment<'a> {
    /// Caches of the build, read-only while compiling. Empty when
    /// incremental compilation is disabled.
    pub caches: &'a IncrementalCaches,
    /// Receives every name resolution.
    pub lookup_tracker: &'a mut dyn LookupTracker,
    /// Polled between units of work.
    pub cancellation: &'a dyn CancellationStatus,
}

impl fmt::Debug for CompilationEnvironment<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompilationEnvironment")
            .field("caches", &self.caches.len())
            .field("cancelled", &self.cancellation.is_canceled())
            .finish_non_exhaustive()
    }
}

/// An external compiler.
pub trait Compiler {
    /// Compiles the targets described by `module_file`, reporting every
    /// output to `collector` and every lookup to the environment's tracker.
    fn compile(
        &mut self,
        module_file: &ModuleFile,
        env: &mut CompilationEnvironment<'_>,
        collector: &mut OutputItemsCollector,
    ) -> ExitCode;
}
