//! Persistent inverted index from looked-up symbols to referencing files.
//!
//! The index lives in `lookups.bin` inside its own directory, framed like
//! every other binary cache file. It is opened under a lock, rewritten as a
//! whole by [`LookupStorage::flush`], and discarded when written by another
//! format or tool version. A damaged file is reported, never ignored.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use ripple_cache::frame::{decode_frame, encode_frame, FrameError};
use ripple_cache::lock::{write_atomic, CacheLock};
use ripple_cache::CacheError;
use ripple_common::InternalError;
use ripple_config::IncrementalMode;
use tracing::{debug, info, warn};

use crate::error::LookupError;
use crate::symbol::LookupSymbol;
use crate::tracker::LookupTracker;

/// Name of the index file within its directory.
pub const LOOKUP_FILE: &str = "lookups.bin";

const LOOKUP_MAGIC: [u8; 4] = *b"RPLK";
const LOOKUP_FORMAT_VERSION: u32 = 1;

static NO_FILES: BTreeSet<PathBuf> = BTreeSet::new();

/// Symbol to referencing-file index of one project.
#[derive(Debug)]
pub struct LookupStorage {
    path: PathBuf,
    tool_version: String,
    symbols: BTreeMap<LookupSymbol, BTreeSet<PathBuf>>,
    /// Reverse of `symbols`, rebuilt on load.
    by_file: BTreeMap<PathBuf, BTreeSet<LookupSymbol>>,
    modified: bool,
    _lock: CacheLock,
}

impl LookupStorage {
    /// Opens (or creates) the index in `dir`.
    pub fn open(dir: &Path, tool_version: &str) -> Result<Self, LookupError> {
        let lock = CacheLock::acquire(dir)?;
        let path = dir.join(LOOKUP_FILE);
        let (symbols, modified) = match std::fs::read(&path) {
            Ok(raw) => match load_index(&path, &raw, tool_version)? {
                Some(symbols) => (symbols, false),
                None => (BTreeMap::new(), true),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => (BTreeMap::new(), false),
            Err(e) => return Err(LookupError::Io { path, source: e }),
        };

        let mut storage = Self {
            path,
            tool_version: tool_version.to_string(),
            symbols: BTreeMap::new(),
            by_file: BTreeMap::new(),
            modified,
            _lock: lock,
        };
        for (symbol, files) in symbols {
            storage.add(symbol, files);
        }
        storage.modified = modified;
        debug!(symbols = storage.symbols.len(), "opened lookup index");
        Ok(storage)
    }

    /// Adds `files` as references of `symbol`.
    pub fn add<I>(&mut self, symbol: LookupSymbol, files: I)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let referencing = self.symbols.entry(symbol.clone()).or_default();
        for file in files {
            self.by_file
                .entry(file.clone())
                .or_default()
                .insert(symbol.clone());
            referencing.insert(file);
        }
        if referencing.is_empty() {
            self.symbols.remove(&symbol);
        }
        self.modified = true;
    }

    /// Files that referenced `symbol`.
    pub fn get(&self, symbol: &LookupSymbol) -> &BTreeSet<PathBuf> {
        self.symbols.get(symbol).unwrap_or(&NO_FILES)
    }

    /// Symbols `file` referenced.
    pub fn lookups_of(&self, file: &Path) -> impl Iterator<Item = &LookupSymbol> {
        self.by_file.get(file).into_iter().flatten()
    }

    /// Deletes every entry of `file`.
    pub fn remove_lookups_from(&mut self, file: &Path) {
        let Some(symbols) = self.by_file.remove(file) else {
            return;
        };
        for symbol in symbols {
            if let Some(files) = self.symbols.get_mut(&symbol) {
                files.remove(file);
                if files.is_empty() {
                    self.symbols.remove(&symbol);
                }
            }
        }
        self.modified = true;
    }

    /// Replaces the entries of every compiled or removed file with the
    /// lookups `tracker` recorded in this pass.
    ///
    /// Does nothing unless `mode` tracks lookups. In that mode `tracker` must
    /// be the recording tracker of the pass; anything else is an internal
    /// error, since indexing nothing would leave dependents unrecompiled.
    pub fn update<'a, C, R>(
        &mut self,
        tracker: &dyn LookupTracker,
        files_to_compile: C,
        removed_files: R,
        mode: IncrementalMode,
    ) -> Result<(), LookupError>
    where
        C: IntoIterator<Item = &'a PathBuf>,
        R: IntoIterator<Item = &'a PathBuf>,
    {
        if !mode.tracks_lookups() {
            return Ok(());
        }
        let recording = tracker.as_recording().ok_or_else(|| {
            InternalError::new("lookup index update requires the recording lookup tracker")
        })?;

        let mut replaced = 0;
        for file in files_to_compile.into_iter().chain(removed_files) {
            self.remove_lookups_from(file);
            replaced += 1;
        }
        for (symbol, files) in recording.lookups() {
            self.add(symbol.clone(), files.iter().cloned());
        }
        info!(files = replaced, symbols = recording.len(), "updated lookup index");
        Ok(())
    }

    /// Number of indexed symbols.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Returns `true` if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Number of files with at least one entry.
    pub fn file_count(&self) -> usize {
        self.by_file.len()
    }

    /// All indexed symbols with their referencing files.
    pub fn iter(&self) -> impl Iterator<Item = (&LookupSymbol, &BTreeSet<PathBuf>)> {
        self.symbols.iter()
    }

    /// Writes the index back to disk if it changed.
    pub fn flush(&mut self) -> Result<(), LookupError> {
        if !self.modified {
            return Ok(());
        }
        let payload = bincode::serde::encode_to_vec(&self.symbols, bincode::config::standard())
            .map_err(|e| CacheError::Serialization {
                reason: e.to_string(),
            })?;
        let framed = encode_frame(LOOKUP_MAGIC, LOOKUP_FORMAT_VERSION, &self.tool_version, &payload)?;
        write_atomic(&self.path, &framed)?;
        self.modified = false;
        debug!(path = %self.path.display(), symbols = self.symbols.len(), "flushed lookup index");
        Ok(())
    }
}

/// Decodes a stored index; `Ok(None)` if it was written by another version.
fn load_index(
    path: &Path,
    raw: &[u8],
    tool_version: &str,
) -> Result<Option<BTreeMap<LookupSymbol, BTreeSet<PathBuf>>>, LookupError> {
    let corrupt = |reason: String| LookupError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };
    let (header, payload) = match decode_frame(raw, LOOKUP_MAGIC, LOOKUP_FORMAT_VERSION) {
        Ok(decoded) => decoded,
        Err(e @ FrameError::VersionMismatch { .. }) => {
            warn!(path = %path.display(), "{e}, discarding lookup index");
            return Ok(None);
        }
        Err(e) => return Err(corrupt(e.to_string())),
    };
    if header.tool_version != tool_version {
        warn!(
            path = %path.display(),
            found = %header.tool_version,
            "lookup index written by another tool version, discarding"
        );
        return Ok(None);
    }
    let (symbols, _) = bincode::serde::decode_from_slice(payload, bincode::config::standard())
        .map_err(|e| corrupt(e.to_string()))?;
    Ok(Some(symbols))
}
