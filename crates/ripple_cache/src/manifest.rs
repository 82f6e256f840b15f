//! Persisted tables of one target's incremental cache.
//!
//! The manifest is stored as `manifest.json` in the target's cache directory,
//! next to a `format-version.txt` stamp. It records, per source file, the
//! outputs it produced and its content hash, and per output, the sources that
//! produced it and (for classes) the member snapshot used for diffing.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use ripple_common::{ContentHash, TargetId};
use serde::{Deserialize, Serialize};

use crate::error::CacheError;
use crate::lock::{remove_if_exists, write_atomic};
use crate::snapshot::ClassSnapshot;

/// Name of the manifest file within a target cache directory.
pub const MANIFEST_FILE: &str = "manifest.json";

/// Name of the format stamp within a target cache directory.
pub const FORMAT_VERSION_FILE: &str = "format-version.txt";

/// Current layout of the manifest tables. Increment on breaking changes.
pub const CACHE_FORMAT_VERSION: u32 = 1;

/// The persisted state of one target's cache.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheManifest {
    /// Target owning this cache.
    pub target: TargetId,

    /// Content hash of each source as of its last error-free compilation.
    pub source_hashes: BTreeMap<PathBuf, ContentHash>,

    /// Outputs produced by each source.
    pub source_outputs: BTreeMap<PathBuf, BTreeSet<PathBuf>>,

    /// Per-output record.
    pub outputs: BTreeMap<PathBuf, OutputEntry>,
}

/// Cached state of a single output file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputEntry {
    /// Sources that produced the output.
    pub sources: BTreeSet<PathBuf>,

    /// What kind of output it is.
    pub kind: OutputKind,
}

/// Kind-specific data of a cached output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputKind {
    /// A compiled class with its member snapshot.
    Class(ClassSnapshot),
    /// A cross-module mapping file; no member surface.
    ModuleMapping,
}

impl CacheManifest {
    /// Creates a new, empty manifest for `target`.
    pub fn new(target: TargetId) -> Self {
        Self {
            target,
            source_hashes: BTreeMap::new(),
            source_outputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
        }
    }

    /// Loads the manifest from `dir`.
    ///
    /// Returns `Ok(None)` if there is none yet; a file that exists but does
    /// not parse is an error, never a silent cache miss.
    pub fn load(dir: &Path) -> Result<Option<Self>, CacheError> {
        let path = dir.join(MANIFEST_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io { path, source: e }),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| CacheError::ManifestParse {
                path,
                reason: e.to_string(),
            })
    }

    /// Saves the manifest to `dir`, creating the directory if needed.
    pub fn save(&self, dir: &Path) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| CacheError::Serialization {
            reason: e.to_string(),
        })?;
        write_atomic(&dir.join(MANIFEST_FILE), json.as_bytes())
    }

    /// Checks that the source and output tables agree with each other.
    pub fn validate(&self) -> Result<(), CacheError> {
        let inconsistent = |reason: String| CacheError::Inconsistent {
            target: self.target.clone(),
            reason,
        };
        for (source, outputs) in &self.source_outputs {
            for output in outputs {
                let entry = self.outputs.get(output).ok_or_else(|| {
                    inconsistent(format!(
                        "{} lists output {} which has no entry",
                        source.display(),
                        output.display()
                    ))
                })?;
                if !entry.sources.contains(source) {
                    return Err(inconsistent(format!(
                        "output {} does not list source {}",
                        output.display(),
                        source.display()
                    )));
                }
            }
        }
        for (output, entry) in &self.outputs {
            for source in &entry.sources {
                let listed = self
                    .source_outputs
                    .get(source)
                    .is_some_and(|outputs| outputs.contains(output));
                if !listed {
                    return Err(inconsistent(format!(
                        "source {} does not list output {}",
                        source.display(),
                        output.display()
                    )));
                }
            }
        }
        Ok(())
    }
}

/// The cache-format stamp of a target cache directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatStamp {
    /// Manifest layout version.
    pub format_version: u32,
    /// Version of the tool that wrote the cache.
    pub tool_version: String,
}

impl FormatStamp {
    /// The stamp this tool writes.
    pub fn current(tool_version: &str) -> Self {
        Self {
            format_version: CACHE_FORMAT_VERSION,
            tool_version: tool_version.to_string(),
        }
    }

    /// Reads the stamp in `dir`; `Ok(None)` if absent or unreadable as a stamp.
    pub fn load(dir: &Path) -> Result<Option<Self>, CacheError> {
        let path = dir.join(FORMAT_VERSION_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::Io { path, source: e }),
        };
        let mut lines = content.lines();
        let format_version = lines.next().and_then(|l| l.trim().parse::<u32>().ok());
        let tool_version = lines.next().map(|l| l.trim().to_string());
        Ok(match (format_version, tool_version) {
            (Some(format_version), Some(tool_version)) => Some(Self {
                format_version,
                tool_version,
            }),
            _ => None,
        })
    }

    /// Writes the stamp into `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), CacheError> {
        let content = format!("{}\n{}\n", self.format_version, self.tool_version);
        write_atomic(&dir.join(FORMAT_VERSION_FILE), content.as_bytes())
    }
}

/// Deletes the persisted tables and stamp in `dir`, leaving the directory.
pub fn wipe(dir: &Path) -> Result<(), CacheError> {
    remove_if_exists(&dir.join(MANIFEST_FILE))?;
    remove_if_exists(&dir.join(FORMAT_VERSION_FILE))
}
