//! Lookup trackers handed to the compiler for the length of one pass.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use ripple_common::FqName;
use ripple_config::IncrementalMode;

use crate::symbol::LookupSymbol;

/// Receives every name resolution the compiler performs.
pub trait LookupTracker {
    /// Records that `file` looked up `name` in `scope`.
    fn record(&mut self, file: &Path, scope: &FqName, name: &str);

    /// Returns the recorded lookups if this tracker keeps them.
    fn as_recording(&self) -> Option<&RecordingLookupTracker> {
        None
    }
}

/// Tracker that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DoNothingLookupTracker;

impl LookupTracker for DoNothingLookupTracker {
    fn record(&mut self, _file: &Path, _scope: &FqName, _name: &str) {}
}

/// Tracker that keeps every lookup of the pass in memory and forwards each
/// one to an optional parent tracker.
#[derive(Default)]
pub struct RecordingLookupTracker {
    lookups: BTreeMap<LookupSymbol, BTreeSet<PathBuf>>,
    parent: Option<Box<dyn LookupTracker>>,
}

impl RecordingLookupTracker {
    /// Creates a tracker with no parent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a tracker that forwards to `parent`.
    pub fn with_parent(parent: Option<Box<dyn LookupTracker>>) -> Self {
        Self {
            lookups: BTreeMap::new(),
            parent,
        }
    }

    /// Recorded lookups, grouped by symbol.
    pub fn lookups(&self) -> impl Iterator<Item = (&LookupSymbol, &BTreeSet<PathBuf>)> {
        self.lookups.iter()
    }

    /// Files that looked up `symbol` in this pass.
    pub fn files_for(&self, symbol: &LookupSymbol) -> Option<&BTreeSet<PathBuf>> {
        self.lookups.get(symbol)
    }

    /// Number of distinct symbols recorded.
    pub fn len(&self) -> usize {
        self.lookups.len()
    }

    /// Returns `true` if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.lookups.is_empty()
    }
}

impl LookupTracker for RecordingLookupTracker {
    fn record(&mut self, file: &Path, scope: &FqName, name: &str) {
        self.lookups
            .entry(LookupSymbol::new(name, scope.clone()))
            .or_default()
            .insert(file.to_path_buf());
        if let Some(parent) = self.parent.as_mut() {
            parent.record(file, scope, name);
        }
    }

    fn as_recording(&self) -> Option<&RecordingLookupTracker> {
        Some(self)
    }
}

impl fmt::Debug for RecordingLookupTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordingLookupTracker")
            .field("symbols", &self.lookups.len())
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}

/// Chooses the tracker for a pass.
///
/// Lookups are recorded only in experimental mode; otherwise the parent (or
/// a do-nothing tracker) is used directly.
pub fn make_lookup_tracker(
    mode: IncrementalMode,
    parent: Option<Box<dyn LookupTracker>>,
) -> Box<dyn LookupTracker> {
    if mode.tracks_lookups() {
        Box::new(RecordingLookupTracker::with_parent(parent))
    } else {
        parent.unwrap_or_else(|| Box::new(DoNothingLookupTracker))
    }
}
