//! Per-symbol propagation of changes to the files that must be recompiled.

use std::collections::BTreeSet;
use std::path::PathBuf;

use ripple_cache::CompilationResult;
use ripple_lookup::{LookupStorage, LookupSymbol};
use tracing::debug;

/// Files that looked up any changed member of `result`.
///
/// Only member changes are propagated here; header changes are handled at
/// target granularity by the build driver.
pub fn dirty_files(result: &CompilationResult, storage: &LookupStorage) -> BTreeSet<PathBuf> {
    let mut dirty = BTreeSet::new();
    for (scope, names) in result.changed_members() {
        for name in names {
            let symbol = LookupSymbol::new(name.as_str(), scope.clone());
            let files = storage.get(&symbol);
            if !files.is_empty() {
                debug!(%symbol, files = files.len(), "propagating member change");
            }
            dirty.extend(files.iter().cloned());
        }
    }
    dirty
}
