//! Directory fixtures for pipeline tests.

use std::path::{Path, PathBuf};

use crate::config::{PipelineConfig, PipelineConfigBuilder};

/// A scratch layout with `photos/`, `out/` and `tmp/` under one root.
#[derive(Debug, Clone)]
pub struct TestWorkspace {
    root: PathBuf,
}

impl TestWorkspace {
    /// Creates the layout under `root`, with one placeholder photograph.
    pub fn create(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let workspace = Self { root: root.into() };
        std::fs::create_dir_all(workspace.photos())?;
        std::fs::create_dir_all(workspace.temp_root())?;
        std::fs::write(workspace.photos().join("IMG_0001.jpg"), b"\xFF\xD8\xFF")?;
        Ok(workspace)
    }

    /// The workspace root.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Input photograph directory.
    #[must_use]
    pub fn photos(&self) -> PathBuf {
        self.root.join("photos")
    }

    /// Output directory. Not created up front.
    #[must_use]
    pub fn output(&self) -> PathBuf {
        self.root.join("out")
    }

    /// Build directory under the output directory.
    #[must_use]
    pub fn build(&self) -> PathBuf {
        self.output().join("build")
    }

    /// Root for the run's temporary directories.
    #[must_use]
    pub fn temp_root(&self) -> PathBuf {
        self.root.join("tmp")
    }

    /// A config builder pointed at this workspace.
    #[must_use]
    pub fn config_builder(&self) -> PipelineConfigBuilder {
        PipelineConfig::builder()
            .input_dir(self.photos())
            .output_dir(self.output())
            .temp_root(self.temp_root())
    }

    /// Entries currently under the temp root.
    pub fn temp_entries(&self) -> std::io::Result<Vec<PathBuf>> {
        std::fs::read_dir(self.temp_root())?
            .map(|entry| entry.map(|e| e.path()))
            .collect()
    }
}
