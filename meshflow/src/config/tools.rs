//! Tool tunables and binary locations.

use crate::core::{MeshFormat, Toolchain};
use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the reference camera-sensor database is fetched from when the
/// caller does not supply one.
pub const DEFAULT_CAMERA_DATABASE_URL: &str = "https://raw.githubusercontent.com/openMVG/openMVG/refs/heads/develop/src/openMVG/exif/sensor_width_database/sensor_width_camera_database.txt";

/// Constants embedded in the external tools' argument lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolParameters {
    /// Focal length in pixels passed to image listing.
    pub focal_length: f64,
    /// Feature describer used by feature computation.
    pub describer_method: String,
    /// Geometric model used by the match filter (`f`, `e`, `h`, ...).
    pub geometric_model: String,
    /// Reconstruction engine.
    pub sfm_engine: String,
    /// Number of scales used by mesh refinement.
    pub refine_scales: u32,
    /// Maximum face area used by mesh refinement.
    pub max_face_area: u32,
    /// Format the textured mesh is exported and published in.
    pub texture_export_type: MeshFormat,
    /// URL of the camera-sensor database.
    pub camera_database_url: String,
}

impl Default for ToolParameters {
    fn default() -> Self {
        Self {
            focal_length: 2304.0,
            describer_method: "SIFT".to_string(),
            geometric_model: "f".to_string(),
            sfm_engine: "INCREMENTAL".to_string(),
            refine_scales: 1,
            max_face_area: 16,
            texture_export_type: MeshFormat::Obj,
            camera_database_url: DEFAULT_CAMERA_DATABASE_URL.to_string(),
        }
    }
}

impl ToolParameters {
    /// Creates parameters with the default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses parameters from JSON. Missing keys keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let params: Self = serde_json::from_str(json).map_err(|e| {
            ConfigurationError::new(format!("invalid tool parameters: {e}")).with_field("parameters")
        })?;
        params.validate()?;
        Ok(params)
    }

    /// Loads parameters from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigurationError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::new(format!(
                "cannot read tool parameters {}: {e}",
                path.display()
            ))
            .with_field("parameters")
        })?;
        Self::from_json_str(&contents)
    }

    /// Sets the focal length.
    #[must_use]
    pub fn with_focal_length(mut self, focal_length: f64) -> Self {
        self.focal_length = focal_length;
        self
    }

    /// Sets the geometric model.
    #[must_use]
    pub fn with_geometric_model(mut self, model: impl Into<String>) -> Self {
        self.geometric_model = model.into();
        self
    }

    /// Sets the textured mesh format.
    #[must_use]
    pub fn with_texture_export_type(mut self, format: MeshFormat) -> Self {
        self.texture_export_type = format;
        self
    }

    /// Sets the camera database URL.
    #[must_use]
    pub fn with_camera_database_url(mut self, url: impl Into<String>) -> Self {
        self.camera_database_url = url.into();
        self
    }

    /// Checks the values are usable as tool arguments.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !self.focal_length.is_finite() || self.focal_length <= 0.0 {
            return Err(ConfigurationError::new("focal length must be a positive number")
                .with_field("focal_length"));
        }
        for (field, value) in [
            ("describer_method", &self.describer_method),
            ("geometric_model", &self.geometric_model),
            ("sfm_engine", &self.sfm_engine),
            ("camera_database_url", &self.camera_database_url),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigurationError::new(format!("{field} cannot be empty")).with_field(field));
            }
        }
        if self.refine_scales == 0 {
            return Err(ConfigurationError::new("refine scales must be at least 1")
                .with_field("refine_scales"));
        }
        Ok(())
    }
}

/// Optional directories holding each toolchain's binaries.
///
/// A toolchain without a directory is resolved through `PATH`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolLocations {
    /// Directory of the SfM binaries.
    #[serde(default)]
    pub sfm_bin_dir: Option<PathBuf>,
    /// Directory of the MVS binaries.
    #[serde(default)]
    pub mvs_bin_dir: Option<PathBuf>,
}

impl ToolLocations {
    /// Returns the program to execute for a tool.
    #[must_use]
    pub fn resolve(&self, toolchain: Toolchain, tool: &str) -> PathBuf {
        let dir = match toolchain {
            Toolchain::Sfm => self.sfm_bin_dir.as_ref(),
            Toolchain::Mvs => self.mvs_bin_dir.as_ref(),
        };
        dir.map_or_else(|| PathBuf::from(tool), |d| d.join(tool))
    }
}
