//! Source file hashing and change detection.
//!
//! Compares the current content hashes of a target's sources with the hashes
//! recorded after its last error-free pass, yielding the initial dirty and
//! removed sets of an incremental build.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use ripple_common::ContentHash;

use crate::error::CacheError;

/// Classification of a target's sources against the recorded hashes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceChanges {
    /// Sources never compiled successfully before.
    pub new_files: Vec<PathBuf>,

    /// Sources whose content hash differs from the recorded one.
    pub modified_files: Vec<PathBuf>,

    /// Recorded sources that are no longer part of the target.
    pub deleted_files: Vec<PathBuf>,

    /// Sources whose content hash matches.
    pub unchanged_files: Vec<PathBuf>,
}

impl SourceChanges {
    /// Returns `true` if nothing was added, modified, or deleted.
    pub fn is_empty(&self) -> bool {
        self.new_files.is_empty() && self.modified_files.is_empty() && self.deleted_files.is_empty()
    }

    /// Sources that must be compiled: new plus modified.
    pub fn dirty_files(&self) -> impl Iterator<Item = &PathBuf> {
        self.new_files.iter().chain(&self.modified_files)
    }
}

/// Computes content hashes of source files.
pub struct SourceHasher;

impl SourceHasher {
    /// Hashes a single file.
    pub fn hash_file(path: &Path) -> Result<ContentHash, CacheError> {
        let content = std::fs::read(path).map_err(|e| CacheError::io(path, e))?;
        Ok(ContentHash::from_bytes(&content))
    }

    /// Hashes several files.
    ///
    /// Files that cannot be read are skipped; they then show up as deleted.
    pub fn hash_files<'a>(
        paths: impl IntoIterator<Item = &'a PathBuf>,
    ) -> BTreeMap<PathBuf, ContentHash> {
        paths
            .into_iter()
            .filter_map(|path| Self::hash_file(path).ok().map(|hash| (path.clone(), hash)))
            .collect()
    }

    /// Classifies `current` against `recorded`.
    pub fn detect_changes(
        current: &BTreeMap<PathBuf, ContentHash>,
        recorded: &BTreeMap<PathBuf, ContentHash>,
    ) -> SourceChanges {
        let mut changes = SourceChanges::default();
        for (path, hash) in current {
            match recorded.get(path) {
                Some(old) if old == hash => changes.unchanged_files.push(path.clone()),
                Some(_) => changes.modified_files.push(path.clone()),
                None => changes.new_files.push(path.clone()),
            }
        }
        changes.deleted_files = recorded
            .keys()
            .filter(|p| !current.contains_key(*p))
            .cloned()
            .collect();
        changes
    }
}
