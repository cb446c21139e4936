//! The inter-stage file-naming protocol and the artifact set of a run.

use crate::errors::ConfigurationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// File names agreed between adjacent stages.
///
/// The external tools locate their inputs by these names, so they must not
/// change.
pub mod names {
    /// Scene description written by image listing.
    pub const SFM_DATA_JSON: &str = "sfm_data.json";
    /// Candidate image pairs.
    pub const PAIRS: &str = "pairs.bin";
    /// Putative matches.
    pub const PUTATIVE_MATCHES: &str = "matches.putative.bin";
    /// Geometrically filtered matches.
    pub const FILTERED_MATCHES: &str = "matches.f.bin";
    /// Binary sparse reconstruction.
    pub const SFM_DATA_BIN: &str = "sfm_data.bin";
    /// Colorized sparse point cloud.
    pub const COLORIZED_PLY: &str = "colorized.ply";
    /// Scene converted for the MVS toolchain.
    pub const SCENE: &str = "scene.mvs";
    /// Densified scene.
    pub const DENSE_SCENE: &str = "scene_dense.mvs";
    /// Reconstructed mesh.
    pub const MESH: &str = "scene_mesh.ply";
    /// Refined mesh scene.
    pub const REFINED_SCENE: &str = "scene_dense_mesh_refine.mvs";
    /// Refined mesh geometry, written next to the refined scene.
    pub const REFINED_MESH: &str = "scene_dense_mesh_refine.ply";
    /// Textured scene passed to the texturing tool as output stem.
    pub const TEXTURED_SCENE: &str = "scene_dense_mesh_refine_texture.mvs";
    /// Stem of the textured mesh files written by the texturing tool.
    pub const TEXTURED_MESH_STEM: &str = "scene_dense_mesh_refine_texture";
    /// Stem of the published mesh files in the output directory.
    pub const FINAL_STEM: &str = "final";
}

/// Mesh formats the texturing tool can export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeshFormat {
    /// Wavefront OBJ with an MTL material library.
    #[default]
    Obj,
    /// Stanford PLY.
    Ply,
    /// Binary glTF.
    Glb,
    /// JSON glTF.
    Gltf,
}

impl MeshFormat {
    /// The value passed to `--export-type`, also the file extension.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Obj => "obj",
            Self::Ply => "ply",
            Self::Glb => "glb",
            Self::Gltf => "gltf",
        }
    }

    /// File names of a mesh with this stem, geometry first.
    ///
    /// Only OBJ carries a separate material file.
    #[must_use]
    pub fn files(self, stem: &str) -> Vec<String> {
        let mut files = vec![format!("{stem}.{}", self.as_str())];
        if self == Self::Obj {
            files.push(format!("{stem}.mtl"));
        }
        files
    }
}

impl fmt::Display for MeshFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MeshFormat {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "obj" => Ok(Self::Obj),
            "ply" => Ok(Self::Ply),
            "glb" => Ok(Self::Glb),
            "gltf" => Ok(Self::Gltf),
            other => Err(ConfigurationError::new(format!(
                "unsupported mesh export type '{other}' (expected obj, ply, glb or gltf)"
            ))
            .with_field("texture_export_type")),
        }
    }
}

/// A produced artifact, attributed to the stage that wrote it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactEntry {
    /// The stage that produced the artifact.
    pub stage: String,
    /// Where the artifact lives.
    pub path: PathBuf,
}

/// Artifacts accumulated over a run, in production order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ArtifactSet {
    entries: Vec<ArtifactEntry>,
}

impl ArtifactSet {
    /// Creates an empty artifact set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an artifact produced by a stage.
    pub fn record(&mut self, stage: impl Into<String>, path: impl Into<PathBuf>) {
        self.entries.push(ArtifactEntry {
            stage: stage.into(),
            path: path.into(),
        });
    }

    /// Returns true if the path has been recorded.
    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.entries.iter().any(|e| e.path == path)
    }

    /// Returns the artifacts produced by a stage.
    #[must_use]
    pub fn produced_by(&self, stage: &str) -> Vec<&Path> {
        self.entries
            .iter()
            .filter(|e| e.stage == stage)
            .map(|e| e.path.as_path())
            .collect()
    }

    /// Returns all entries.
    #[must_use]
    pub fn entries(&self) -> &[ArtifactEntry] {
        &self.entries
    }

    /// Returns the number of recorded artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
