//! The multi-round incremental build driver.
//!
//! A build opens the caches of the requested targets and their dependencies,
//! compiles the sources whose content changed since the last error-free
//! build, and keeps compiling the files affected by each round's changes
//! until a round produces no new dirty files. When the configured round
//! limit is reached the affected targets are recompiled in full once.
//!
//! Caches and the lookup index are written back only after an error-free,
//! uncancelled build; otherwise the on-disk state stays as it was and the
//! same sources are found dirty again next time. Files of targets outside
//! the build that were affected by its changes lose their recorded hashes,
//! so the next build of their target compiles them.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use ripple_cache::{incremental_caches, CacheLock, CompilationResult, IncrementalCache, IncrementalCaches};
use ripple_common::TargetId;
use ripple_config::{IncrementalMode, RippleConfig, DEFAULT_MAX_ROUNDS};
use ripple_lookup::{make_lookup_tracker, LookupStorage, LookupTracker};
use tracing::{debug, info, warn};

use crate::compiler::{CancellationStatus, CompilationEnvironment, Compiler, ExitCode, OutputItemsCollector};
use crate::descriptor::{ModuleDescriptor, ModuleFile};
use crate::dirty::dirty_files;
use crate::error::BuildError;
use crate::model::BuildModel;
use crate::output::generated_files;
use crate::update::update_incremental_cache;

/// Subdirectory of the cache directory holding one directory per target.
pub const TARGETS_DIR: &str = "targets";

/// Subdirectory of the cache directory holding the lookup index.
pub const LOOKUPS_DIR: &str = "lookups";

/// Settings of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Incremental mode.
    pub mode: IncrementalMode,
    /// Rounds before falling back to a full rebuild of the affected targets.
    pub max_rounds: u32,
    /// Root of the persistent caches.
    pub cache_dir: PathBuf,
    /// Version of the tool, recorded in every persisted file.
    pub tool_version: String,
}

impl BuildOptions {
    /// Options with the default round limit.
    pub fn new(mode: IncrementalMode, cache_dir: impl Into<PathBuf>, tool_version: impl Into<String>) -> Self {
        Self {
            mode,
            max_rounds: DEFAULT_MAX_ROUNDS,
            cache_dir: cache_dir.into(),
            tool_version: tool_version.into(),
        }
    }

    /// Options taken from a loaded configuration.
    pub fn from_config(config: &RippleConfig, project_root: &Path, tool_version: impl Into<String>) -> Self {
        Self {
            mode: config.incremental.mode,
            max_rounds: config.incremental.max_rounds,
            cache_dir: config.cache_dir(project_root),
            tool_version: tool_version.into(),
        }
    }

    /// Sets the round limit.
    pub fn with_max_rounds(mut self, max_rounds: u32) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// Cache directory of `target`.
    pub fn target_cache_dir(&self, target: &TargetId) -> PathBuf {
        self.cache_dir.join(TARGETS_DIR).join(target.dir_name())
    }

    /// Directory of the lookup index.
    pub fn lookups_dir(&self) -> PathBuf {
        self.cache_dir.join(LOOKUPS_DIR)
    }
}

/// Outcome of a build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Compiler invocations.
    pub rounds: u32,
    /// Every source compiled.
    pub compiled: BTreeSet<PathBuf>,
    /// Sources found removed since the last build.
    pub removed: BTreeSet<PathBuf>,
    /// All changes saved into the caches.
    pub changes: CompilationResult,
    /// Whether the build recompiled whole targets without incremental
    /// propagation, either because incremental compilation is disabled or
    /// because the round limit was reached.
    pub full_rebuild: bool,
    /// Whether the compiler reported errors. Nothing was persisted if so.
    pub compilation_errors: bool,
}

/// Sources compiled and removed per target over the whole build.
#[derive(Debug, Default)]
struct SourceRecord {
    compiled: BTreeSet<PathBuf>,
    removed: BTreeSet<PathBuf>,
}

/// Result of one compiler invocation plus cache update.
struct Round {
    exit: ExitCode,
    changes: CompilationResult,
    tracker: Box<dyn LookupTracker>,
}

/// Drives incremental builds of a [`BuildModel`] with a [`Compiler`].
#[derive(Debug)]
pub struct IncrementalBuild<C> {
    model: BuildModel,
    compiler: C,
    options: BuildOptions,
}

impl<C: Compiler> IncrementalBuild<C> {
    /// Creates a driver.
    pub fn new(model: BuildModel, compiler: C, options: BuildOptions) -> Self {
        Self {
            model,
            compiler,
            options,
        }
    }

    /// The build model.
    pub fn model(&self) -> &BuildModel {
        &self.model
    }

    /// Replaces the build model, e.g. after sources were added or removed.
    pub fn set_model(&mut self, model: BuildModel) {
        self.model = model;
    }

    /// The compiler.
    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    /// The compiler, mutably.
    pub fn compiler_mut(&mut self) -> &mut C {
        &mut self.compiler
    }

    /// The options.
    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Builds `requested` and their dependencies.
    ///
    /// Returns [`BuildError::Cancelled`] if `cancellation` fires; nothing is
    /// persisted in that case.
    pub fn run(
        &mut self,
        requested: &[TargetId],
        cancellation: &dyn CancellationStatus,
    ) -> Result<BuildSummary, BuildError> {
        let scope = self.build_scope(requested)?;
        info!(
            requested = requested.len(),
            targets = scope.len(),
            mode = %self.options.mode,
            "starting build"
        );
        if self.options.mode.is_enabled() {
            self.run_incremental(requested, &scope, cancellation)
        } else {
            self.run_full(&scope, cancellation)
        }
    }

    /// `requested` plus their transitive dependencies, in compilation order.
    fn build_scope(&self, requested: &[TargetId]) -> Result<Vec<TargetId>, BuildError> {
        let graph = self.model.graph();
        let mut included = BTreeSet::new();
        for target in requested {
            if !graph.contains(target) {
                return Err(BuildError::InvalidModel {
                    reason: format!("requested target {target} is not part of the build"),
                });
            }
            included.insert(target.clone());
            included.extend(graph.transitive_dependencies(target).into_iter().cloned());
        }
        Ok(graph
            .compilation_order()?
            .into_iter()
            .filter(|t| included.contains(*t))
            .cloned()
            .collect())
    }

    /// One non-incremental compilation of every source in scope.
    fn run_full(
        &mut self,
        scope: &[TargetId],
        cancellation: &dyn CancellationStatus,
    ) -> Result<BuildSummary, BuildError> {
        let sources: BTreeSet<PathBuf> = scope
            .iter()
            .filter_map(|id| self.model.get(id))
            .flat_map(|t| t.sources.iter().cloned())
            .collect();
        if cancellation.is_canceled() {
            return Err(BuildError::Cancelled);
        }
        let caches = IncrementalCaches::default();
        let mut tracker = make_lookup_tracker(IncrementalMode::Disabled, None);
        let mut collector = OutputItemsCollector::new();
        let groups = group_by_owner(&self.model, &sources, &caches, scope);
        let exit = compile(
            &mut self.compiler,
            &self.options.cache_dir,
            "full",
            descriptors(&self.model, scope, &groups),
            &caches,
            &mut *tracker,
            cancellation,
            &mut collector,
        )?;
        if cancellation.is_canceled() {
            return Err(BuildError::Cancelled);
        }
        info!(files = sources.len(), outputs = collector.len(), %exit, "full build finished");
        Ok(BuildSummary {
            rounds: 1,
            compiled: sources,
            full_rebuild: true,
            compilation_errors: !exit.is_ok(),
            ..BuildSummary::default()
        })
    }

    fn run_incremental(
        &mut self,
        requested: &[TargetId],
        scope: &[TargetId],
        cancellation: &dyn CancellationStatus,
    ) -> Result<BuildSummary, BuildError> {
        let Self {
            model,
            compiler,
            options,
        } = self;
        let mode = options.mode;

        let mut caches = incremental_caches(scope, requested, |id| model.dependencies_of(id), |id| {
            IncrementalCache::open(&options.target_cache_dir(id), id.clone(), &options.tool_version)
        })?;
        let mut lookups = if mode.tracks_lookups() {
            Some(LookupStorage::open(&options.lookups_dir(), &options.tool_version)?)
        } else {
            None
        };

        let mut dirty = BTreeSet::new();
        let mut removed: BTreeMap<TargetId, BTreeSet<PathBuf>> = BTreeMap::new();
        for (id, cache) in caches.iter_mut() {
            let sources = model.get(id).map(|t| t.sources.as_slice()).unwrap_or_default();
            let changes = cache.detect_source_changes(sources);
            debug!(
                target_id = %id,
                new = changes.new_files.len(),
                modified = changes.modified_files.len(),
                deleted = changes.deleted_files.len(),
                "detected source changes"
            );
            dirty.extend(changes.dirty_files().cloned());
            if !changes.deleted_files.is_empty() {
                removed.insert(id.clone(), changes.deleted_files.into_iter().collect());
            }
        }

        let mut summary = BuildSummary::default();
        let mut records: BTreeMap<TargetId, SourceRecord> = BTreeMap::new();
        let mut outside: BTreeMap<TargetId, BTreeSet<PathBuf>> = BTreeMap::new();
        loop {
            if dirty.is_empty() && removed.is_empty() {
                break;
            }
            if cancellation.is_canceled() {
                return Err(BuildError::Cancelled);
            }

            let fallback = summary.rounds >= options.max_rounds;
            if fallback {
                dirty = affected_sources(model, &caches, &dirty);
                summary.full_rebuild = true;
                warn!(
                    max_rounds = options.max_rounds,
                    files = dirty.len(),
                    "round limit reached, recompiling affected targets in full"
                );
            }
            summary.rounds += 1;

            let groups = group_by_owner(model, &dirty, &caches, scope);
            let round_targets: Vec<TargetId> = scope
                .iter()
                .filter(|id| groups.contains_key(*id) || removed.contains_key(*id))
                .cloned()
                .collect();
            let mut removed_now = BTreeSet::new();
            for id in &round_targets {
                let record = records.entry(id.clone()).or_default();
                let compiled = groups.get(id).cloned().unwrap_or_default();
                let gone = removed.remove(id).unwrap_or_default();
                record.compiled.extend(compiled.iter().cloned());
                record.removed.extend(gone.iter().cloned());
                summary.compiled.extend(compiled.iter().cloned());
                summary.removed.extend(gone.iter().cloned());
                removed_now.extend(gone.iter().cloned());
                if let Some(cache) = caches.get_mut(id) {
                    cache.mark_dirty(compiled.into_iter().chain(gone));
                }
            }
            info!(round = summary.rounds, files = dirty.len(), targets = round_targets.len(), "compiling round");

            let round = compile_round(
                model,
                compiler,
                options,
                summary.rounds,
                &groups,
                &round_targets,
                &mut caches,
                cancellation,
            )?;
            if !round.exit.is_ok() {
                warn!(round = summary.rounds, exit = %round.exit, "compilation failed, keeping caches unchanged");
                summary.compilation_errors = true;
                summary.changes += round.changes;
                return Ok(summary);
            }

            let compiled_now: BTreeSet<PathBuf> = groups.values().flatten().cloned().collect();
            let removed_all: BTreeSet<PathBuf> = records.values().flat_map(|r| r.removed.iter().cloned()).collect();
            if let Some(storage) = lookups.as_mut() {
                storage.update(&*round.tracker, &compiled_now, &removed_now, mode)?;
            }

            let mut next = match &lookups {
                Some(storage) => dirty_files(&round.changes, storage),
                None => changed_targets_sources(model, &caches),
            };
            next.extend(proto_changed_sources(model, &caches));
            next.retain(|file| !compiled_now.contains(file) && !removed_all.contains(file));
            next.retain(|file| match model.owner_of(file) {
                Some(owner) if caches.contains(owner) => true,
                Some(owner) => {
                    outside.entry(owner.clone()).or_default().insert(file.clone());
                    false
                }
                None => false,
            });
            for (_, cache) in caches.iter_mut() {
                cache.take_pass_changes();
            }
            summary.changes += round.changes;

            debug!(round = summary.rounds, next = next.len(), "computed next dirty set");
            if fallback {
                break;
            }
            dirty = next;
        }

        for (id, record) in &records {
            if let Some(cache) = caches.get_mut(id) {
                cache.update_source_hashes(&record.compiled, &record.removed)?;
            }
        }
        forget_outside_sources(options, &outside)?;
        caches.flush_all()?;
        if let Some(storage) = lookups.as_mut() {
            storage.flush()?;
        }
        info!(
            rounds = summary.rounds,
            compiled = summary.compiled.len(),
            removed = summary.removed.len(),
            full_rebuild = summary.full_rebuild,
            "build finished"
        );
        Ok(summary)
    }
}

/// Compiles one round and saves its outputs into the caches.
#[allow(clippy::too_many_arguments)]
fn compile_round<C: Compiler>(
    model: &BuildModel,
    compiler: &mut C,
    options: &BuildOptions,
    round: u32,
    groups: &BTreeMap<TargetId, BTreeSet<PathBuf>>,
    round_targets: &[TargetId],
    caches: &mut IncrementalCaches,
    cancellation: &dyn CancellationStatus,
) -> Result<Round, BuildError> {
    let mut tracker = make_lookup_tracker(options.mode, None);
    let mut collector = OutputItemsCollector::new();
    let exit = if round_targets.is_empty() {
        ExitCode::Ok
    } else {
        compile(
            compiler,
            &options.cache_dir,
            &format!("round-{round}"),
            descriptors(model, round_targets, groups),
            caches,
            &mut *tracker,
            cancellation,
            &mut collector,
        )?
    };
    if cancellation.is_canceled() {
        return Err(BuildError::Cancelled);
    }

    let generated = match round_targets.first() {
        Some(representative) => generated_files(
            round_targets,
            representative,
            |id| model.get(id).map(|t| t.sources.clone()).unwrap_or_default(),
            |id| model.get(id).map(|t| t.output_dir.clone()),
            &collector,
        ),
        None => Vec::new(),
    };
    let changes = update_incremental_cache(options.mode, round_targets, &generated, caches, !exit.is_ok())?;
    Ok(Round {
        exit,
        changes,
        tracker,
    })
}

/// One descriptor per target, with the target's sources from `groups`.
///
/// Targets without sources to compile are still described so the compiler
/// regenerates their module mapping.
fn descriptors(
    model: &BuildModel,
    targets: &[TargetId],
    groups: &BTreeMap<TargetId, BTreeSet<PathBuf>>,
) -> Vec<ModuleDescriptor> {
    targets
        .iter()
        .filter_map(|id| {
            let sources: Vec<PathBuf> = groups.get(id).map(|s| s.iter().cloned().collect()).unwrap_or_default();
            model
                .get(id)
                .map(|target| ModuleDescriptor::for_target(model, target, sources))
        })
        .collect()
}

/// Writes the module file and runs the compiler on it.
#[allow(clippy::too_many_arguments)]
fn compile<C: Compiler>(
    compiler: &mut C,
    cache_dir: &Path,
    name: &str,
    descriptors: Vec<ModuleDescriptor>,
    caches: &IncrementalCaches,
    lookup_tracker: &mut dyn LookupTracker,
    cancellation: &dyn CancellationStatus,
    collector: &mut OutputItemsCollector,
) -> Result<ExitCode, BuildError> {
    let module_file = ModuleFile::write(cache_dir, name, descriptors)?;
    let mut env = CompilationEnvironment {
        caches,
        lookup_tracker,
        cancellation,
    };
    let exit = compiler.compile(&module_file, &mut env, collector);
    debug!(module_file = %module_file.path().display(), outputs = collector.len(), %exit, "compiler finished");
    Ok(exit)
}

/// Groups `files` by owning target, keeping targets of `scope` that have a
/// cache (or every target of `scope` when `caches` is empty).
fn group_by_owner(
    model: &BuildModel,
    files: &BTreeSet<PathBuf>,
    caches: &IncrementalCaches,
    scope: &[TargetId],
) -> BTreeMap<TargetId, BTreeSet<PathBuf>> {
    let mut groups: BTreeMap<TargetId, BTreeSet<PathBuf>> = BTreeMap::new();
    for file in files {
        let Some(owner) = model.owner_of(file) else {
            continue;
        };
        let in_build = if caches.is_empty() {
            scope.contains(owner)
        } else {
            caches.contains(owner)
        };
        if in_build {
            groups.entry(owner.clone()).or_default().insert(file.clone());
        }
    }
    groups
}

/// All sources of targets whose own outputs changed and of targets that
/// depend on a changed target, including dependents outside the build.
fn changed_targets_sources(model: &BuildModel, caches: &IncrementalCaches) -> BTreeSet<PathBuf> {
    let graph = model.graph();
    let mut dirty = BTreeSet::new();
    for (id, cache) in caches.iter() {
        let changed = !cache.pass_changes().is_empty() || !caches.changes_in_dependencies(id).is_empty();
        if changed {
            debug!(target_id = %id, "target affected by changes");
            dirty.extend(sources_of(model, id));
        }
        if !cache.pass_changes().is_empty() {
            for dependent in graph.dependents_of(id).into_iter().filter(|d| !caches.contains(d)) {
                dirty.extend(sources_of(model, dependent));
            }
        }
    }
    dirty
}

/// All sources of every target whose class headers changed and of every
/// target transitively depending on it, inside the build or not.
fn proto_changed_sources(model: &BuildModel, caches: &IncrementalCaches) -> BTreeSet<PathBuf> {
    let graph = model.graph();
    let mut dirty = BTreeSet::new();
    for (id, cache) in caches.iter() {
        if !cache.pass_changes().proto_changed() {
            continue;
        }
        debug!(target_id = %id, "class header changed, rebuilding dependent targets");
        dirty.extend(sources_of(model, id));
        for affected in caches.affected_targets(id) {
            dirty.extend(sources_of(model, &affected));
        }
        for dependent in graph.transitive_dependents(id) {
            dirty.extend(sources_of(model, dependent));
        }
    }
    dirty
}

/// Drops the recorded hashes of `outside` files from their targets' caches.
///
/// A target that has no cache directory yet compiles everything on its first
/// build and is skipped.
fn forget_outside_sources(
    options: &BuildOptions,
    outside: &BTreeMap<TargetId, BTreeSet<PathBuf>>,
) -> Result<(), BuildError> {
    for (id, files) in outside {
        let dir = options.target_cache_dir(id);
        if !dir.is_dir() {
            continue;
        }
        let mut cache = IncrementalCache::open(&dir, id.clone(), &options.tool_version)?;
        cache.forget_source_hashes(files);
        cache.flush()?;
        info!(target_id = %id, files = files.len(), "marked sources of a target outside the build dirty");
    }
    Ok(())
}

/// All sources of the targets owning `files` and of every target
/// transitively depending on them.
fn affected_sources(model: &BuildModel, caches: &IncrementalCaches, files: &BTreeSet<PathBuf>) -> BTreeSet<PathBuf> {
    let mut targets = BTreeSet::new();
    for owner in files.iter().filter_map(|f| model.owner_of(f)) {
        if caches.contains(owner) {
            targets.insert(owner.clone());
            targets.extend(caches.affected_targets(owner));
        }
    }
    targets.iter().flat_map(|id| sources_of(model, id)).collect()
}

fn sources_of(model: &BuildModel, id: &TargetId) -> Vec<PathBuf> {
    model.get(id).map(|t| t.sources.clone()).unwrap_or_default()
}

/// Deletes the persisted caches and lookup index under `cache_dir`.
///
/// Returns the number of target caches removed. Fails if a running build
/// holds any of the locks; a lock file left behind by a build that died is
/// not held and does not get in the way.
pub fn clean(cache_dir: &Path) -> Result<usize, BuildError> {
    let mut cleaned = 0;
    let targets_dir = cache_dir.join(TARGETS_DIR);
    if targets_dir.is_dir() {
        let entries = std::fs::read_dir(&targets_dir).map_err(|e| ripple_cache::CacheError::Io {
            path: targets_dir.clone(),
            source: e,
        })?;
        for entry in entries.flatten() {
            let dir = entry.path();
            if !dir.is_dir() {
                continue;
            }
            let _lock = CacheLock::acquire(&dir)?;
            ripple_cache::manifest::wipe(&dir)?;
            cleaned += 1;
        }
    }
    let lookups_dir = cache_dir.join(LOOKUPS_DIR);
    if lookups_dir.is_dir() {
        let _lock = CacheLock::acquire(&lookups_dir)?;
        ripple_cache::lock::remove_if_exists(&lookups_dir.join(ripple_lookup::storage::LOOKUP_FILE))?;
    }
    info!(cache_dir = %cache_dir.display(), targets = cleaned, "cleaned caches");
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::NeverCancelled;
    use crate::model::ModuleTarget;
    use ripple_config::load_config_from_str;

    struct Recorder(Vec<Vec<PathBuf>>);

    impl Compiler for Recorder {
        fn compile(
            &mut self,
            module_file: &ModuleFile,
            _env: &mut CompilationEnvironment<'_>,
            _collector: &mut OutputItemsCollector,
        ) -> ExitCode {
            self.0.push(
                module_file
                    .descriptors()
                    .iter()
                    .flat_map(|d| d.sources.iter().cloned())
                    .collect(),
            );
            ExitCode::Ok
        }
    }

    fn model() -> BuildModel {
        BuildModel::new([
            ModuleTarget::new(TargetId::production("core"), "out/core").with_source("core/A.kt"),
            ModuleTarget::new(TargetId::production("app"), "out/app")
                .with_source("app/Main.kt")
                .with_dependency(TargetId::production("core")),
            ModuleTarget::new(TargetId::production("tool"), "out/tool").with_source("tool/T.kt"),
        ])
        .unwrap()
    }

    #[test]
    fn options_from_config() {
        let config = load_config_from_str("[incremental]\nmode = \"enabled\"\nmax_rounds = 3\n").unwrap();
        let options = BuildOptions::from_config(&config, Path::new("/project"), "0.1.0");
        assert_eq!(options.mode, IncrementalMode::Enabled);
        assert_eq!(options.max_rounds, 3);
        assert_eq!(
            options.target_cache_dir(&TargetId::test("app")),
            PathBuf::from("/project/.ripple-cache/targets/app-test")
        );
    }

    #[test]
    fn scope_includes_dependencies_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let build = IncrementalBuild::new(
            model(),
            Recorder(Vec::new()),
            BuildOptions::new(IncrementalMode::Experimental, dir.path(), "0.1.0"),
        );
        let scope = build.build_scope(&[TargetId::production("app")]).unwrap();
        assert_eq!(scope, vec![TargetId::production("core"), TargetId::production("app")]);
    }

    #[test]
    fn unknown_requested_target_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut build = IncrementalBuild::new(
            model(),
            Recorder(Vec::new()),
            BuildOptions::new(IncrementalMode::Experimental, dir.path(), "0.1.0"),
        );
        let err = build.run(&[TargetId::production("nope")], &NeverCancelled).unwrap_err();
        assert!(matches!(err, BuildError::InvalidModel { .. }));
    }

    #[test]
    fn disabled_mode_compiles_everything_once() {
        let dir = tempfile::tempdir().unwrap();
        let mut build = IncrementalBuild::new(
            model(),
            Recorder(Vec::new()),
            BuildOptions::new(IncrementalMode::Disabled, dir.path().join("cache"), "0.1.0"),
        );
        let summary = build.run(&[TargetId::production("app")], &NeverCancelled).unwrap();
        assert_eq!(summary.rounds, 1);
        assert!(summary.full_rebuild);
        assert_eq!(
            build.compiler().0,
            vec![vec![PathBuf::from("core/A.kt"), PathBuf::from("app/Main.kt")]]
        );
        assert!(!dir.path().join("cache").join(TARGETS_DIR).exists());
    }

    #[test]
    fn clean_wipes_target_caches() {
        let dir = tempfile::tempdir().unwrap();
        let options = BuildOptions::new(IncrementalMode::Experimental, dir.path(), "0.1.0");
        {
            let core = TargetId::production("core");
            let mut cache = IncrementalCache::open(&options.target_cache_dir(&core), core, "0.1.0").unwrap();
            cache.save_cache_format_version().unwrap();
        }
        assert_eq!(clean(dir.path()).unwrap(), 1);
        assert!(!options
            .target_cache_dir(&TargetId::production("core"))
            .join(ripple_cache::manifest::FORMAT_VERSION_FILE)
            .exists());
    }
}
