//! The capability bundle handed to the runner.

use super::{FileSystem, LocalFileSystem, ResourceProvider};
use crate::exec::{CommandRunner, ProcessRunner};
use std::sync::Arc;

/// Subprocess, filesystem and download access used by a run.
#[derive(Clone)]
pub struct Capabilities {
    /// Runs external tools.
    pub runner: Arc<dyn CommandRunner>,
    /// Filesystem primitives.
    pub fs: Arc<dyn FileSystem>,
    /// Fetches remote resources.
    pub provider: Arc<dyn ResourceProvider>,
}

impl Capabilities {
    /// Bundles explicit capabilities.
    #[must_use]
    pub fn new(
        runner: Arc<dyn CommandRunner>,
        fs: Arc<dyn FileSystem>,
        provider: Arc<dyn ResourceProvider>,
    ) -> Self {
        Self { runner, fs, provider }
    }

    /// Real subprocesses, the local filesystem and HTTP downloads.
    #[must_use]
    pub fn local() -> Self {
        Self::new(
            Arc::new(ProcessRunner::new()),
            Arc::new(LocalFileSystem::new()),
            default_provider(),
        )
    }

    /// Replaces the command runner.
    #[must_use]
    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Replaces the filesystem.
    #[must_use]
    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Replaces the resource provider.
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ResourceProvider>) -> Self {
        self.provider = provider;
        self
    }
}

#[cfg(feature = "download")]
fn default_provider() -> Arc<dyn ResourceProvider> {
    Arc::new(super::HttpResourceProvider::new())
}

#[cfg(not(feature = "download"))]
fn default_provider() -> Arc<dyn ResourceProvider> {
    Arc::new(super::UnavailableResourceProvider)
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("runner", &self.runner)
            .field("fs", &self.fs)
            .finish_non_exhaustive()
    }
}
