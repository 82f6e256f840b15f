//! Exclusive ownership of a cache directory and crash-safe writes.

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;

use crate::error::CacheError;

/// Name of the lock file inside a locked directory.
pub const LOCK_FILE: &str = ".lock";

/// Holds a cache directory for the lifetime of one build pass.
///
/// An exclusive OS advisory lock on [`LOCK_FILE`]. The kernel drops it when
/// the guard's file is closed, which includes the owning process dying, so a
/// killed build never leaves the directory locked. The file itself stays.
#[derive(Debug)]
pub struct CacheLock {
    _file: File,
}

impl CacheLock {
    /// Acquires the lock for `dir`, creating the directory if needed.
    ///
    /// Fails with [`CacheError::Locked`] while another guard holds it.
    pub fn acquire(dir: &Path) -> Result<Self, CacheError> {
        std::fs::create_dir_all(dir).map_err(|e| CacheError::io(dir, e))?;
        let path = dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| CacheError::io(&path, e))?;
        if let Err(e) = FileExt::try_lock_exclusive(&file) {
            let contended = e.kind() == ErrorKind::WouldBlock
                || e.raw_os_error() == fs2::lock_contended_error().raw_os_error();
            return Err(if contended {
                CacheError::Locked { path }
            } else {
                CacheError::io(&path, e)
            });
        }
        // Informational only; nothing reads the pid back.
        let _ = file.set_len(0).and_then(|()| writeln!(file, "{}", std::process::id()));
        Ok(Self { _file: file })
    }
}

/// Writes `data` to `path` through a temporary sibling and a rename, so a
/// crash mid-write never leaves a truncated file behind.
pub fn write_atomic(path: &Path, data: &[u8]) -> Result<(), CacheError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| CacheError::io(parent, e))?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, data).map_err(|e| CacheError::io(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| CacheError::io(path, e))
}

/// Removes a file, treating "not found" as success.
pub fn remove_if_exists(path: &Path) -> Result<(), CacheError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(CacheError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        drop(CacheLock::acquire(dir.path()).unwrap());
        assert!(dir.path().join(LOCK_FILE).exists());
        assert!(CacheLock::acquire(dir.path()).is_ok());
    }

    #[test]
    fn second_acquire_fails() {
        let dir = tempfile::tempdir().unwrap();
        let _first = CacheLock::acquire(dir.path()).unwrap();
        let second = CacheLock::acquire(dir.path());
        assert!(matches!(second, Err(CacheError::Locked { .. })));
    }

    #[test]
    fn lock_file_left_by_a_dead_process_is_not_held() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(LOCK_FILE), "4194304\n").unwrap();
        let lock = CacheLock::acquire(dir.path()).unwrap();
        let pid = std::fs::read_to_string(dir.path().join(LOCK_FILE)).unwrap();
        assert_eq!(pid.trim(), std::process::id().to_string());
        drop(lock);
    }

    #[test]
    fn acquire_creates_nested_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let _lock = CacheLock::acquire(&nested).unwrap();
        assert!(nested.join(LOCK_FILE).exists());
    }

    #[test]
    fn write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sub").join("data.json");
        write_atomic(&path, b"first").unwrap();
        write_atomic(&path, b"second").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"second");
        assert!(!dir.path().join("sub").join("data.json.tmp").exists());
    }

    #[test]
    fn remove_missing_is_ok() {
        let dir = tempfile::tempdir().unwrap();
        assert!(remove_if_exists(&dir.path().join("nothing")).is_ok());
    }
}
