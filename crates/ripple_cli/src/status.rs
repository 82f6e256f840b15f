//! `ripple status`: summary of the persisted caches.

use std::path::{Path, PathBuf};

use ripple_build::session::TARGETS_DIR;
use ripple_cache::manifest::{CacheManifest, FormatStamp, OutputKind, CACHE_FORMAT_VERSION};
use ripple_cache::CacheError;
use ripple_lookup::LookupStorage;
use serde::Serialize;

use crate::project::load_options;
use crate::{GlobalArgs, TOOL_VERSION};

/// State of one target cache directory.
#[derive(Debug, Serialize)]
pub struct TargetStatus {
    /// Owning target, if the manifest names one.
    pub target: Option<String>,
    /// Cache directory.
    pub dir: PathBuf,
    /// Whether the stamp matches this tool; stale caches are wiped on the
    /// next build.
    pub current: bool,
    /// Sources with a recorded hash.
    pub sources: usize,
    /// Recorded outputs.
    pub outputs: usize,
    /// Recorded class outputs.
    pub classes: usize,
}

/// State of the whole cache directory.
#[derive(Debug, Serialize)]
pub struct CacheStatus {
    /// Root of the caches.
    pub cache_dir: PathBuf,
    /// Per-target caches, by directory name.
    pub targets: Vec<TargetStatus>,
    /// Indexed lookup symbols.
    pub lookup_symbols: usize,
    /// Files with indexed lookups.
    pub lookup_files: usize,
}

/// Runs the `ripple status` command.
pub fn run(json: bool, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let options = load_options(global)?;
    let status = collect(&options.cache_dir, &options.lookups_dir())?;
    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else if !global.quiet {
        print_status(&status);
    }
    Ok(0)
}

/// Reads the state of every target cache under `cache_dir` and of the
/// lookup index in `lookups_dir`.
pub fn collect(cache_dir: &Path, lookups_dir: &Path) -> Result<CacheStatus, Box<dyn std::error::Error>> {
    let mut targets = Vec::new();
    let targets_dir = cache_dir.join(TARGETS_DIR);
    if targets_dir.is_dir() {
        let mut dirs: Vec<PathBuf> = std::fs::read_dir(&targets_dir)?
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();
        for dir in dirs {
            targets.push(target_status(&dir)?);
        }
    }

    let (lookup_symbols, lookup_files) = if lookups_dir.is_dir() {
        let storage = LookupStorage::open(lookups_dir, TOOL_VERSION)?;
        (storage.len(), storage.file_count())
    } else {
        (0, 0)
    };

    Ok(CacheStatus {
        cache_dir: cache_dir.to_path_buf(),
        targets,
        lookup_symbols,
        lookup_files,
    })
}

fn target_status(dir: &Path) -> Result<TargetStatus, CacheError> {
    let current = FormatStamp::load(dir)?.is_some_and(|stamp| {
        stamp.format_version == CACHE_FORMAT_VERSION && stamp.tool_version == TOOL_VERSION
    });
    let manifest = CacheManifest::load(dir)?;
    Ok(match manifest {
        Some(manifest) => TargetStatus {
            target: Some(manifest.target.to_string()),
            dir: dir.to_path_buf(),
            current,
            sources: manifest.source_hashes.len(),
            outputs: manifest.outputs.len(),
            classes: manifest
                .outputs
                .values()
                .filter(|entry| matches!(entry.kind, OutputKind::Class(_)))
                .count(),
        },
        None => TargetStatus {
            target: None,
            dir: dir.to_path_buf(),
            current,
            sources: 0,
            outputs: 0,
            classes: 0,
        },
    })
}

fn print_status(status: &CacheStatus) {
    println!("cache: {}", status.cache_dir.display());
    if status.targets.is_empty() {
        println!("  no target caches");
    }
    for target in &status.targets {
        let name = target
            .target
            .clone()
            .unwrap_or_else(|| format!("<empty: {}>", target.dir.display()));
        let stale = if target.current { "" } else { " (stale)" };
        println!(
            "  {name}{stale}: {} sources, {} outputs, {} classes",
            target.sources, target.outputs, target.classes
        );
    }
    println!(
        "lookups: {} symbols from {} files",
        status.lookup_symbols, status.lookup_files
    );
}
