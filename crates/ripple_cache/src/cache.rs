//! The incremental cache of a single target.
//!
//! An [`IncrementalCache`] owns one target's cache directory for the length
//! of a build: it is opened under a lock, mutated by that target's passes
//! only, and written back by [`IncrementalCache::flush`]. Dropping it without
//! flushing leaves the persisted tables as they were.

use std::collections::{BTreeMap, BTreeSet};
use std::mem;
use std::path::{Path, PathBuf};

use ripple_common::{ContentHash, InternalError, TargetId};
use tracing::{debug, info, warn};

use crate::change::{ChangeInfo, CompilationResult};
use crate::error::CacheError;
use crate::generated::GeneratedClass;
use crate::hasher::{SourceChanges, SourceHasher};
use crate::lock::{remove_if_exists, CacheLock};
use crate::manifest::{self, CacheManifest, FormatStamp, OutputEntry, OutputKind};
use crate::snapshot::{class_name_change, diff, ClassSnapshot};

/// Persistent per-target record of outputs, member snapshots, and source
/// hashes.
#[derive(Debug)]
pub struct IncrementalCache {
    dir: PathBuf,
    tool_version: String,
    manifest: CacheManifest,
    dependents: BTreeSet<TargetId>,
    /// Sources compiled or removed in the current pass.
    dirty_sources: BTreeSet<PathBuf>,
    /// Outputs saved in the current pass.
    produced: BTreeSet<PathBuf>,
    pass_changes: CompilationResult,
    /// Source hashes taken by the last change detection.
    detected: BTreeMap<PathBuf, ContentHash>,
    format_stamped: bool,
    modified: bool,
    _lock: CacheLock,
}

impl IncrementalCache {
    /// Opens (or creates) the cache for `target` in `dir`.
    ///
    /// A cache written with a different format or tool version is wiped and
    /// starts empty. A manifest that cannot be parsed, that belongs to another
    /// target, or whose tables disagree is an error.
    pub fn open(dir: &Path, target: TargetId, tool_version: &str) -> Result<Self, CacheError> {
        let lock = CacheLock::acquire(dir)?;
        let current = FormatStamp::current(tool_version);
        let stamp = FormatStamp::load(dir)?;
        let format_stamped = stamp.as_ref() == Some(&current);

        let manifest = if format_stamped {
            match CacheManifest::load(dir)? {
                Some(manifest) => {
                    if manifest.target != target {
                        return Err(CacheError::Inconsistent {
                            target,
                            reason: format!("{} holds the cache of {}", dir.display(), manifest.target),
                        });
                    }
                    manifest.validate()?;
                    manifest
                }
                None => CacheManifest::new(target),
            }
        } else {
            if let Some(stamp) = stamp {
                warn!(
                    target_id = %target,
                    found_format = stamp.format_version,
                    found_tool = %stamp.tool_version,
                    "cache version mismatch, discarding cache"
                );
            }
            manifest::wipe(dir)?;
            CacheManifest::new(target)
        };

        debug!(target_id = %manifest.target, outputs = manifest.outputs.len(), "opened incremental cache");
        Ok(Self {
            dir: dir.to_path_buf(),
            tool_version: tool_version.to_string(),
            manifest,
            dependents: BTreeSet::new(),
            dirty_sources: BTreeSet::new(),
            produced: BTreeSet::new(),
            pass_changes: CompilationResult::NO_CHANGES,
            detected: BTreeMap::new(),
            format_stamped,
            modified: false,
            _lock: lock,
        })
    }

    /// Target owning this cache.
    pub fn target(&self) -> &TargetId {
        &self.manifest.target
    }

    /// Cache directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Stamps the cache directory with the current format and tool version.
    ///
    /// Must precede every write of a pass; repeated calls are no-ops.
    pub fn save_cache_format_version(&mut self) -> Result<(), CacheError> {
        if !self.format_stamped {
            FormatStamp::current(&self.tool_version).save(&self.dir)?;
            self.format_stamped = true;
        }
        Ok(())
    }

    /// Records sources compiled or removed in this pass.
    ///
    /// Their previously recorded outputs become candidates for
    /// [`IncrementalCache::clear_cache_for_removed_classes`].
    pub fn mark_dirty<I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        self.dirty_sources.extend(sources);
    }

    /// Stores the snapshot of a newly produced class and returns what changed
    /// relative to the previously stored snapshot of the same output path.
    ///
    /// A class without a stored snapshot also changes its own name in the
    /// enclosing package; that change lands in [`IncrementalCache::pass_changes`]
    /// only.
    pub fn save_file_to_cache(&mut self, class: &GeneratedClass) -> Result<ChangeInfo, CacheError> {
        self.require_stamped("save_file_to_cache")?;
        let output = class.output();
        self.require_own(&output.target)?;

        let snapshot = ClassSnapshot::from_artifact(class.artifact()?);
        let previous = match self.manifest.outputs.get(&output.output_file) {
            Some(OutputEntry {
                kind: OutputKind::Class(old),
                ..
            }) => Some(old),
            _ => None,
        };
        let change = diff(previous, Some(&snapshot));
        let name_change = class_name_change(previous, Some(&snapshot));
        debug!(
            output = %output.output_file.display(),
            class = %snapshot.fq_name,
            ?change,
            "saved class"
        );

        self.record_output(&output.output_file, &output.source_files, OutputKind::Class(snapshot));
        self.pass_changes += change.clone();
        self.pass_changes += name_change;
        Ok(change)
    }

    /// Records a module mapping output. Mapping files have no member surface,
    /// so this always returns [`ChangeInfo::NoChanges`].
    pub fn save_module_mapping_to_cache(
        &mut self,
        source_files: &BTreeSet<PathBuf>,
        output_file: &Path,
    ) -> Result<ChangeInfo, CacheError> {
        self.require_stamped("save_module_mapping_to_cache")?;
        self.record_output(output_file, source_files, OutputKind::ModuleMapping);
        Ok(ChangeInfo::NoChanges)
    }

    /// Removes outputs that dirty sources produced before but not in this pass.
    ///
    /// Does nothing when the pass had compilation errors (or was aborted):
    /// outputs that were not produced may still be intended. Otherwise every
    /// removed class is diffed against the empty class and its name is
    /// reported changed in the enclosing package. Its entry and its stale
    /// file are deleted and the pass state is reset.
    pub fn clear_cache_for_removed_classes(
        &mut self,
        compilation_errors: bool,
    ) -> Result<CompilationResult, CacheError> {
        if compilation_errors {
            debug!(target_id = %self.target(), "pass had errors, keeping recorded outputs");
            return Ok(CompilationResult::NO_CHANGES);
        }
        self.require_stamped("clear_cache_for_removed_classes")?;

        let removed: BTreeSet<PathBuf> = self
            .dirty_sources
            .iter()
            .filter_map(|source| self.manifest.source_outputs.get(source))
            .flatten()
            .filter(|output| !self.produced.contains(*output))
            .cloned()
            .collect();

        let mut result = CompilationResult::NO_CHANGES;
        for output in &removed {
            let Some(entry) = self.forget_output(output) else {
                continue;
            };
            let change = match &entry.kind {
                OutputKind::Class(old) => {
                    CompilationResult::from(diff(Some(old), None)) + class_name_change(Some(old), None)
                }
                OutputKind::ModuleMapping => CompilationResult::NO_CHANGES,
            };
            debug!(output = %output.display(), ?change, "removed stale output");
            remove_if_exists(output)?;
            result += change;
        }

        if !removed.is_empty() {
            info!(target_id = %self.target(), removed = removed.len(), "cleared removed outputs");
        }
        self.pass_changes += result.clone();
        self.dirty_sources.clear();
        self.produced.clear();
        Ok(result)
    }

    /// Registers `dependent` as a target that depends on this one.
    ///
    /// Returns `false` if the edge was already present or points at this
    /// cache's own target.
    pub fn add_dependent_cache(&mut self, dependent: &TargetId) -> bool {
        if dependent == self.target() {
            return false;
        }
        self.dependents.insert(dependent.clone())
    }

    /// Targets registered through [`IncrementalCache::add_dependent_cache`].
    pub fn dependents(&self) -> impl Iterator<Item = &TargetId> {
        self.dependents.iter()
    }

    /// Changes saved into this cache since the last
    /// [`IncrementalCache::take_pass_changes`].
    pub fn pass_changes(&self) -> &CompilationResult {
        &self.pass_changes
    }

    /// Returns and resets the accumulated changes.
    pub fn take_pass_changes(&mut self) -> CompilationResult {
        mem::take(&mut self.pass_changes)
    }

    /// Classifies `sources` against the hashes recorded after the last
    /// error-free pass.
    ///
    /// The hashes taken here are the ones later recorded by
    /// [`IncrementalCache::update_source_hashes`], so an edit made while the
    /// build runs is seen by the next detection.
    pub fn detect_source_changes(&mut self, sources: &[PathBuf]) -> SourceChanges {
        self.detected = SourceHasher::hash_files(sources);
        SourceHasher::detect_changes(&self.detected, &self.manifest.source_hashes)
    }

    /// Records the detected hashes of `compiled` sources and forgets
    /// `removed` ones. Call after an error-free pass.
    ///
    /// A compiled source that was not hashed by
    /// [`IncrementalCache::detect_source_changes`] loses its recorded hash and
    /// is new to the next build.
    pub fn update_source_hashes<'a, C, R>(&mut self, compiled: C, removed: R) -> Result<(), CacheError>
    where
        C: IntoIterator<Item = &'a PathBuf>,
        R: IntoIterator<Item = &'a PathBuf>,
    {
        self.require_stamped("update_source_hashes")?;
        for source in compiled {
            match self.detected.get(source) {
                Some(hash) => {
                    self.manifest.source_hashes.insert(source.clone(), *hash);
                }
                None => {
                    self.manifest.source_hashes.remove(source);
                }
            }
        }
        for source in removed {
            self.manifest.source_hashes.remove(source);
        }
        self.modified = true;
        Ok(())
    }

    /// Drops the recorded hashes of `sources` so the next build sees them as
    /// new. Needs no stamp: a cache without hashes compiles everything.
    pub fn forget_source_hashes<'a, I>(&mut self, sources: I)
    where
        I: IntoIterator<Item = &'a PathBuf>,
    {
        for source in sources {
            if self.manifest.source_hashes.remove(source).is_some() {
                self.modified = true;
            }
        }
    }

    /// Sources recorded with a hash.
    pub fn known_sources(&self) -> impl Iterator<Item = &PathBuf> {
        self.manifest.source_hashes.keys()
    }

    /// Number of recorded outputs.
    pub fn output_count(&self) -> usize {
        self.manifest.outputs.len()
    }

    /// Number of recorded class outputs.
    pub fn class_count(&self) -> usize {
        self.manifest
            .outputs
            .values()
            .filter(|e| matches!(e.kind, OutputKind::Class(_)))
            .count()
    }

    /// Returns `true` if `output` has an entry.
    pub fn contains_output(&self, output: &Path) -> bool {
        self.manifest.outputs.contains_key(output)
    }

    /// Stored snapshot of a class output.
    pub fn class_snapshot(&self, output: &Path) -> Option<&ClassSnapshot> {
        match self.manifest.outputs.get(output) {
            Some(OutputEntry {
                kind: OutputKind::Class(snapshot),
                ..
            }) => Some(snapshot),
            _ => None,
        }
    }

    /// Writes modified tables back to disk.
    pub fn flush(&mut self) -> Result<(), CacheError> {
        if !self.modified {
            return Ok(());
        }
        self.manifest.validate()?;
        self.manifest.save(&self.dir)?;
        self.modified = false;
        debug!(target_id = %self.target(), "flushed incremental cache");
        Ok(())
    }

    /// Deletes the persisted tables and releases the directory.
    pub fn clean(self) -> Result<(), CacheError> {
        manifest::wipe(&self.dir)
    }

    fn record_output(&mut self, output: &Path, sources: &BTreeSet<PathBuf>, kind: OutputKind) {
        self.forget_output(output);
        for source in sources {
            self.manifest
                .source_outputs
                .entry(source.clone())
                .or_default()
                .insert(output.to_path_buf());
        }
        self.manifest.outputs.insert(
            output.to_path_buf(),
            OutputEntry {
                sources: sources.clone(),
                kind,
            },
        );
        self.produced.insert(output.to_path_buf());
        self.modified = true;
    }

    fn forget_output(&mut self, output: &Path) -> Option<OutputEntry> {
        let entry = self.manifest.outputs.remove(output)?;
        for source in &entry.sources {
            if let Some(outputs) = self.manifest.source_outputs.get_mut(source) {
                outputs.remove(output);
                if outputs.is_empty() {
                    self.manifest.source_outputs.remove(source);
                }
            }
        }
        self.modified = true;
        Some(entry)
    }

    fn require_stamped(&self, operation: &str) -> Result<(), CacheError> {
        if self.format_stamped {
            Ok(())
        } else {
            Err(InternalError::new(format!(
                "{operation} called on the cache of {} before save_cache_format_version",
                self.target()
            ))
            .into())
        }
    }

    fn require_own(&self, target: &TargetId) -> Result<(), CacheError> {
        if target == self.target() {
            Ok(())
        } else {
            Err(InternalError::new(format!(
                "output of {target} saved into the cache of {}",
                self.target()
            ))
            .into())
        }
    }
}
