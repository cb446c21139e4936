//! Persistent and run-scoped directories.

use super::FileSystem;
use crate::errors::IoError;
use crate::utils::{generate_uuid, short_id};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, warn};

/// Prefix of every temporary directory created by a run.
pub const TEMP_PREFIX: &str = "meshflow";

/// A directory created for the duration of one run.
///
/// Releasing the handle consumes it.
#[derive(Debug, PartialEq, Eq)]
pub struct TempResource {
    label: String,
    path: PathBuf,
}

impl TempResource {
    /// The label the resource was acquired with.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Creates persistent directories and scoped temporary ones.
#[derive(Debug, Clone)]
pub struct DirectoryManager {
    fs: Arc<dyn FileSystem>,
    temp_root: PathBuf,
}

impl DirectoryManager {
    /// Creates a manager placing temporary directories under `temp_root`.
    #[must_use]
    pub fn new(fs: Arc<dyn FileSystem>, temp_root: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            temp_root: temp_root.into(),
        }
    }

    /// Resolves `path` to an absolute directory, creating it if missing.
    ///
    /// Calling this repeatedly on the same path has no further effect.
    pub fn ensure_persistent(&self, path: &Path) -> Result<PathBuf, IoError> {
        self.fs.ensure_dir(path)
    }

    /// Returns the path a temporary directory with `label` and `token` gets.
    #[must_use]
    pub fn temporary_path(&self, label: &str, token: &str) -> PathBuf {
        self.temp_root.join(format!("{TEMP_PREFIX}-{label}-{token}"))
    }

    /// Creates a uniquely named directory under the temp root.
    ///
    /// The name carries a random UUID. An existing directory with the same
    /// name is an error.
    pub fn acquire_temporary(&self, label: &str) -> Result<TempResource, IoError> {
        self.fs.ensure_dir(&self.temp_root)?;
        let path = self.temporary_path(label, &short_id(&generate_uuid()));
        self.fs.create_dir(&path)?;
        debug!(label, path = %path.display(), "Acquired temporary directory");

        Ok(TempResource {
            label: label.to_string(),
            path,
        })
    }

    /// Removes a temporary directory and its contents.
    ///
    /// A directory that is already gone counts as released.
    pub fn release(&self, resource: TempResource) -> Result<(), IoError> {
        match self.fs.remove_dir_all(&resource.path) {
            Ok(()) => Ok(()),
            Err(e) if e.source.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %resource.path.display(), "Temporary directory already removed");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Outcome of releasing a [`TempResourceSet`].
#[derive(Debug, Default)]
pub struct ReleaseSummary {
    /// Paths that were removed.
    pub released: Vec<PathBuf>,
    /// Paths that could not be removed, with the error.
    pub failures: Vec<(PathBuf, IoError)>,
}

impl ReleaseSummary {
    /// Returns true if every resource was removed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// The temporary resources owned by one run.
#[derive(Debug, Default)]
pub struct TempResourceSet {
    resources: Vec<TempResource>,
}

impl TempResourceSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes ownership of a resource.
    pub fn push(&mut self, resource: TempResource) {
        self.resources.push(resource);
    }

    /// Returns the owned paths in acquisition order.
    #[must_use]
    pub fn paths(&self) -> Vec<&Path> {
        self.resources.iter().map(TempResource::path).collect()
    }

    /// Returns the number of owned resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Returns true if nothing is owned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Releases every resource in LIFO order.
    ///
    /// Failures are collected but do not stop the remaining releases. The set
    /// is empty afterwards, so a second call releases nothing.
    pub fn release_all(&mut self, manager: &DirectoryManager) -> ReleaseSummary {
        let mut summary = ReleaseSummary::default();

        for resource in std::mem::take(&mut self.resources).into_iter().rev() {
            let path = resource.path.clone();
            match manager.release(resource) {
                Ok(()) => summary.released.push(path),
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to release temporary directory");
                    summary.failures.push((path, e));
                }
            }
        }

        summary
    }
}
