//! The validated pipeline configuration.

use super::{ToolLocations, ToolParameters};
use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Name of the default build directory inside the output directory.
const DEFAULT_BUILD_DIR_NAME: &str = "build";

/// Locations and tunables for one pipeline.
///
/// Construct through [`PipelineConfig::builder`]; the builder rejects empty
/// input or output directories before any external tool can run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    input_dir: PathBuf,
    output_dir: PathBuf,
    build_dir: PathBuf,
    temp_root: PathBuf,
    camera_database: Option<PathBuf>,
    max_threads: usize,
    stage_timeout: Option<Duration>,
    parameters: ToolParameters,
    locations: ToolLocations,
    verify_artifacts: bool,
    publish_sparse: bool,
}

impl PipelineConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::new()
    }

    /// Directory of input photographs.
    #[must_use]
    pub fn input_dir(&self) -> &Path {
        &self.input_dir
    }

    /// Directory receiving the published mesh.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Working directory shared by the conversion stage and the MVS stages.
    #[must_use]
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Parent directory of the run's temporary directories.
    #[must_use]
    pub fn temp_root(&self) -> &Path {
        &self.temp_root
    }

    /// Caller-supplied camera-sensor database, if any.
    #[must_use]
    pub fn camera_database(&self) -> Option<&Path> {
        self.camera_database.as_deref()
    }

    /// Thread count forwarded to densification and refinement.
    #[must_use]
    pub fn max_threads(&self) -> usize {
        self.max_threads
    }

    /// Per-stage timeout, if any.
    #[must_use]
    pub fn stage_timeout(&self) -> Option<Duration> {
        self.stage_timeout
    }

    /// Tool tunables.
    #[must_use]
    pub fn parameters(&self) -> &ToolParameters {
        &self.parameters
    }

    /// Tool binary locations.
    #[must_use]
    pub fn locations(&self) -> &ToolLocations {
        &self.locations
    }

    /// Whether each stage's expected artifacts are checked after it exits.
    #[must_use]
    pub fn verify_artifacts(&self) -> bool {
        self.verify_artifacts
    }

    /// Whether the sparse reconstruction is copied to the output directory.
    #[must_use]
    pub fn publish_sparse(&self) -> bool {
        self.publish_sparse
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug, Clone, Default)]
pub struct PipelineConfigBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    build_dir: Option<PathBuf>,
    temp_root: Option<PathBuf>,
    camera_database: Option<PathBuf>,
    max_threads: Option<usize>,
    stage_timeout_seconds: Option<f64>,
    parameters: Option<ToolParameters>,
    locations: ToolLocations,
    verify_artifacts: bool,
    publish_sparse: bool,
}

impl PipelineConfigBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the input image directory.
    #[must_use]
    pub fn input_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.input_dir = Some(path.into());
        self
    }

    /// Sets the output directory.
    #[must_use]
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(path.into());
        self
    }

    /// Sets the build directory. Defaults to `<output>/build`.
    #[must_use]
    pub fn build_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.build_dir = Some(path.into());
        self
    }

    /// Sets the root for temporary directories. Defaults to the system temp dir.
    #[must_use]
    pub fn temp_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(path.into());
        self
    }

    /// Sets the camera-sensor database. An empty path means "download one".
    #[must_use]
    pub fn camera_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.camera_database = Some(path.into());
        self
    }

    /// Sets the thread count forwarded to the MVS tools.
    #[must_use]
    pub fn max_threads(mut self, threads: usize) -> Self {
        self.max_threads = Some(threads);
        self
    }

    /// Sets a per-stage timeout in seconds.
    #[must_use]
    pub fn stage_timeout_seconds(mut self, seconds: f64) -> Self {
        self.stage_timeout_seconds = Some(seconds);
        self
    }

    /// Sets the tool parameters.
    #[must_use]
    pub fn parameters(mut self, parameters: ToolParameters) -> Self {
        self.parameters = Some(parameters);
        self
    }

    /// Sets the tool binary locations.
    #[must_use]
    pub fn locations(mut self, locations: ToolLocations) -> Self {
        self.locations = locations;
        self
    }

    /// Enables checking each stage's expected artifacts.
    #[must_use]
    pub fn verify_artifacts(mut self, enabled: bool) -> Self {
        self.verify_artifacts = enabled;
        self
    }

    /// Enables copying the sparse reconstruction to the output directory.
    #[must_use]
    pub fn publish_sparse(mut self, enabled: bool) -> Self {
        self.publish_sparse = enabled;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the input or output directory is
    /// missing or empty, a path is not valid UTF-8, the thread count is zero,
    /// the timeout is not a representable positive duration, or the tool
    /// parameters are invalid.
    pub fn build(self) -> Result<PipelineConfig, ConfigurationError> {
        let input_dir = required_dir(self.input_dir, "input_dir", "input directory")?;
        let output_dir = required_dir(self.output_dir, "output_dir", "output directory")?;

        let max_threads = self.max_threads.unwrap_or(1);
        if max_threads == 0 {
            return Err(ConfigurationError::new("max threads must be at least 1")
                .with_field("max_threads"));
        }

        let stage_timeout = self.stage_timeout_seconds.map(timeout_from_secs).transpose()?;

        let parameters = self.parameters.unwrap_or_default();
        parameters.validate()?;

        let build_dir = self
            .build_dir
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| output_dir.join(DEFAULT_BUILD_DIR_NAME));
        let temp_root = self
            .temp_root
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(std::env::temp_dir);
        let camera_database = self.camera_database.filter(|p| !p.as_os_str().is_empty());

        require_utf8(&input_dir, "input_dir")?;
        require_utf8(&output_dir, "output_dir")?;
        require_utf8(&build_dir, "build_dir")?;
        require_utf8(&temp_root, "temp_root")?;
        if let Some(path) = &camera_database {
            require_utf8(path, "camera_database")?;
        }

        Ok(PipelineConfig {
            input_dir,
            output_dir,
            build_dir,
            temp_root,
            camera_database,
            max_threads,
            stage_timeout,
            parameters,
            locations: self.locations,
            verify_artifacts: self.verify_artifacts,
            publish_sparse: self.publish_sparse,
        })
    }
}

fn required_dir(
    path: Option<PathBuf>,
    field: &str,
    label: &str,
) -> Result<PathBuf, ConfigurationError> {
    match path {
        Some(p) if !p.as_os_str().is_empty() => Ok(p),
        _ => Err(ConfigurationError::new(format!("{label} must be specified")).with_field(field)),
    }
}

fn timeout_from_secs(seconds: f64) -> Result<Duration, ConfigurationError> {
    let invalid = || {
        ConfigurationError::new("stage timeout must be a positive number of seconds")
            .with_field("stage_timeout_seconds")
    };
    if seconds <= 0.0 {
        return Err(invalid());
    }
    Duration::try_from_secs_f64(seconds).map_err(|_| invalid())
}

/// Rejects paths that cannot be passed to a tool without lossy conversion.
pub(crate) fn require_utf8(path: &Path, field: &str) -> Result<(), ConfigurationError> {
    if path.to_str().is_some() {
        Ok(())
    } else {
        Err(ConfigurationError::new(format!(
            "path is not valid UTF-8: {}",
            path.display()
        ))
        .with_field(field))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> PipelineConfigBuilder {
        PipelineConfig::builder().input_dir("./photos").output_dir("./out")
    }

    #[test]
    fn test_minimal_config_defaults() {
        let config = base().build().unwrap();

        assert_eq!(config.input_dir(), Path::new("./photos"));
        assert_eq!(config.output_dir(), Path::new("./out"));
        assert_eq!(config.build_dir(), Path::new("./out/build"));
        assert_eq!(config.max_threads(), 1);
        assert!(config.camera_database().is_none());
        assert!(config.stage_timeout().is_none());
        assert!(!config.verify_artifacts());
        assert!(!config.publish_sparse());
        assert_eq!(config.temp_root(), std::env::temp_dir());
    }

    #[test]
    fn test_missing_input_dir() {
        let err = PipelineConfig::builder().output_dir("./out").build().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("input_dir"));
    }

    #[test]
    fn test_empty_output_dir() {
        let err = PipelineConfig::builder()
            .input_dir("./photos")
            .output_dir("")
            .build()
            .unwrap_err();
        assert_eq!(err.field.as_deref(), Some("output_dir"));
    }

    #[test]
    fn test_zero_threads_rejected() {
        let err = base().max_threads(0).build().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("max_threads"));
    }

    #[test]
    fn test_timeout_must_be_positive() {
        assert!(base().stage_timeout_seconds(0.0).build().is_err());
        assert!(base().stage_timeout_seconds(f64::NAN).build().is_err());

        let config = base().stage_timeout_seconds(1.5).build().unwrap();
        assert_eq!(config.stage_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_unrepresentable_timeout_rejected() {
        for seconds in [1e30, f64::MAX, f64::INFINITY, -1.0] {
            let err = base().stage_timeout_seconds(seconds).build().unwrap_err();
            assert_eq!(err.field.as_deref(), Some("stage_timeout_seconds"));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_paths_rejected() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let bad = Path::new(OsStr::from_bytes(b"/data/ph\xffotos"));

        let err = PipelineConfig::builder()
            .input_dir(bad)
            .output_dir("./out")
            .build()
            .unwrap_err();
        assert_eq!(err.field.as_deref(), Some("input_dir"));

        let err = base().camera_database(bad).build().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("camera_database"));

        let err = base().temp_root(bad).build().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("temp_root"));
    }

    #[test]
    fn test_empty_camera_database_means_download() {
        let config = base().camera_database("").build().unwrap();
        assert!(config.camera_database().is_none());

        let config = base().camera_database("/data/sensors.txt").build().unwrap();
        assert_eq!(config.camera_database(), Some(Path::new("/data/sensors.txt")));
    }

    #[test]
    fn test_explicit_build_dir() {
        let config = base().build_dir("/scratch/build").build().unwrap();
        assert_eq!(config.build_dir(), Path::new("/scratch/build"));
    }

    #[test]
    fn test_invalid_parameters_rejected() {
        let params = ToolParameters::new().with_geometric_model("");
        let err = base().parameters(params).build().unwrap_err();
        assert_eq!(err.field.as_deref(), Some("geometric_model"));
    }
}
