//! Filesystem capability.

use crate::errors::IoError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Filesystem primitives the engine depends on.
pub trait FileSystem: Send + Sync + std::fmt::Debug {
    /// Resolves `path` to an absolute path and creates it, with parents, if
    /// it does not exist. Idempotent.
    fn ensure_dir(&self, path: &Path) -> Result<PathBuf, IoError>;

    /// Creates exactly one new directory. Fails if it already exists.
    fn create_dir(&self, path: &Path) -> Result<(), IoError>;

    /// Removes a directory and everything below it.
    fn remove_dir_all(&self, path: &Path) -> Result<(), IoError>;

    /// Copies `src` to `dst`, overwriting `dst`. Returns the bytes copied.
    fn copy_file(&self, src: &Path, dst: &Path) -> Result<u64, IoError>;

    /// Moves `src` to `dst` within one filesystem, replacing `dst`.
    fn rename(&self, src: &Path, dst: &Path) -> Result<(), IoError>;

    /// Removes a single file.
    fn remove_file(&self, path: &Path) -> Result<(), IoError>;

    /// Returns true if something exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Returns true if `path` is an existing directory.
    fn is_dir(&self, path: &Path) -> bool;
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Creates a new local filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn absolute(path: &Path) -> Result<PathBuf, IoError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    std::env::current_dir()
        .map(|cwd| cwd.join(path))
        .map_err(|e| IoError::new("resolve absolute path of", path, e))
}

impl FileSystem for LocalFileSystem {
    fn ensure_dir(&self, path: &Path) -> Result<PathBuf, IoError> {
        let abs = absolute(path)?;
        if !abs.exists() {
            info!(path = %abs.display(), "Creating directory");
            std::fs::create_dir_all(&abs).map_err(|e| IoError::new("create directory", &abs, e))?;
        } else if !abs.is_dir() {
            return Err(IoError::new(
                "create directory",
                &abs,
                std::io::Error::new(std::io::ErrorKind::AlreadyExists, "path exists and is not a directory"),
            ));
        }
        Ok(abs)
    }

    fn create_dir(&self, path: &Path) -> Result<(), IoError> {
        std::fs::create_dir(path).map_err(|e| IoError::new("create directory", path, e))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), IoError> {
        debug!(path = %path.display(), "Removing directory");
        std::fs::remove_dir_all(path).map_err(|e| IoError::new("remove directory", path, e))
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<u64, IoError> {
        info!(src = %src.display(), dst = %dst.display(), "Copying file");
        std::fs::copy(src, dst).map_err(|e| IoError::new(format!("copy {} to", src.display()), dst, e))
    }

    fn rename(&self, src: &Path, dst: &Path) -> Result<(), IoError> {
        debug!(src = %src.display(), dst = %dst.display(), "Renaming file");
        std::fs::rename(src, dst).map_err(|e| IoError::new(format!("rename {} to", src.display()), dst, e))
    }

    fn remove_file(&self, path: &Path) -> Result<(), IoError> {
        debug!(path = %path.display(), "Removing file");
        std::fs::remove_file(path).map_err(|e| IoError::new("remove file", path, e))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
