//! Filesystem primitives the engine consumes.
//!
//! Paths arrive in the engine's canonical forward-slash form and are turned
//! into native paths here. Absence is reported as `None`/empty, never as an
//! error.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Host file operations needed by the codec, reconciler and backup manager.
pub trait HostFs: Send + Sync + std::fmt::Debug {
    /// Read a file. Returns `Ok(None)` if it does not exist.
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>>;

    /// Write a file, creating parent directories as needed.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<()>;

    fn exists(&self, path: &str) -> bool;

    fn copy(&self, src: &str, dst: &str) -> Result<()>;

    /// File names (not paths) in a directory. Missing directory → empty.
    fn list_dir(&self, path: &str) -> Result<Vec<String>>;

    fn remove(&self, path: &str) -> Result<()>;
}

/// `HostFs` over `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl LocalFs {
    pub fn new() -> Self {
        Self
    }
}

pub fn native_path(path: &str) -> PathBuf {
    if cfg!(windows) {
        PathBuf::from(path.replace('/', "\\"))
    } else {
        PathBuf::from(path)
    }
}

impl HostFs for LocalFs {
    fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let native = native_path(path);
        match std::fs::read(&native) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(Error::io(native, err)),
        }
    }

    fn write(&self, path: &str, bytes: &[u8]) -> Result<()> {
        let native = native_path(path);
        if let Some(parent) = native.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        std::fs::write(&native, bytes).map_err(|e| Error::io(native, e))
    }

    fn exists(&self, path: &str) -> bool {
        native_path(path).exists()
    }

    fn copy(&self, src: &str, dst: &str) -> Result<()> {
        let from = native_path(src);
        let to = native_path(dst);
        std::fs::copy(&from, &to)
            .map(|_| ())
            .map_err(|e| Error::io(from, e))
    }

    fn list_dir(&self, path: &str) -> Result<Vec<String>> {
        let native = native_path(path);
        let entries = match std::fs::read_dir(&native) {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::io(native, err)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&native, e))?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        Ok(names)
    }

    fn remove(&self, path: &str) -> Result<()> {
        let native = native_path(path);
        std::fs::remove_file(&native).map_err(|e| Error::io(native, e))
    }
}

/// Canonical string form of a native path.
pub fn canonical_string(path: &Path) -> String {
    crate::config::paths::normalize_path(&path.to_string_lossy())
}
