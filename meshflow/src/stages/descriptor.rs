//! Stage descriptor and the inputs its argument builder sees.

use crate::config::PipelineConfig;
use crate::core::Toolchain;
use crate::exec::Invocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// The directories a run hands from stage to stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunLayout {
    /// Input photographs.
    pub input_dir: PathBuf,
    /// Published output.
    pub output_dir: PathBuf,
    /// Shared working directory of the conversion and MVS stages.
    pub build_dir: PathBuf,
    /// Temporary directory for the scene description, features and matches.
    pub matches_dir: PathBuf,
    /// Temporary directory for the sparse reconstruction.
    pub reconstruction_dir: PathBuf,
    /// Camera-sensor database file.
    pub camera_database: PathBuf,
}

impl RunLayout {
    /// A file in the matches directory.
    #[must_use]
    pub fn matches(&self, name: &str) -> PathBuf {
        self.matches_dir.join(name)
    }

    /// A file in the reconstruction directory.
    #[must_use]
    pub fn reconstruction(&self, name: &str) -> PathBuf {
        self.reconstruction_dir.join(name)
    }

    /// A file in the build directory.
    #[must_use]
    pub fn build(&self, name: &str) -> PathBuf {
        self.build_dir.join(name)
    }

    /// A file in the output directory.
    #[must_use]
    pub fn output(&self, name: &str) -> PathBuf {
        self.output_dir.join(name)
    }
}

/// Everything a stage's argument builder may read.
#[derive(Debug, Clone, Copy)]
pub struct StageInputs<'a> {
    /// The run configuration.
    pub config: &'a PipelineConfig,
    /// The run's directory layout.
    pub layout: &'a RunLayout,
}

impl<'a> StageInputs<'a> {
    /// Creates stage inputs.
    #[must_use]
    pub fn new(config: &'a PipelineConfig, layout: &'a RunLayout) -> Self {
        Self { config, layout }
    }
}

/// Builds a stage's argument list.
pub type ArgBuilder = fn(&StageInputs<'_>) -> Vec<String>;

/// Lists the files a stage is expected to write.
pub type ArtifactResolver = fn(&StageInputs<'_>) -> Vec<PathBuf>;

/// An immutable description of one pipeline stage.
#[derive(Clone, Copy)]
pub struct StageDescriptor {
    /// Unique stage name.
    pub name: &'static str,
    /// Executable name of the external tool.
    pub tool: &'static str,
    /// Toolchain the executable belongs to.
    pub toolchain: Toolchain,
    build_args: ArgBuilder,
    produces: ArtifactResolver,
}

impl StageDescriptor {
    /// Creates a stage descriptor.
    #[must_use]
    pub const fn new(
        name: &'static str,
        tool: &'static str,
        toolchain: Toolchain,
        build_args: ArgBuilder,
        produces: ArtifactResolver,
    ) -> Self {
        Self {
            name,
            tool,
            toolchain,
            build_args,
            produces,
        }
    }

    /// Builds the argument list. Pure: the same inputs give the same list.
    #[must_use]
    pub fn args(&self, inputs: &StageInputs<'_>) -> Vec<String> {
        (self.build_args)(inputs)
    }

    /// The artifacts the stage writes for these inputs.
    #[must_use]
    pub fn expected_artifacts(&self, inputs: &StageInputs<'_>) -> Vec<PathBuf> {
        (self.produces)(inputs)
    }

    /// Resolves the full invocation for these inputs.
    #[must_use]
    pub fn invocation(&self, inputs: &StageInputs<'_>) -> Invocation {
        let program = inputs.config.locations().resolve(self.toolchain, self.tool);
        Invocation::new(self.name, program, self.args(inputs))
            .with_produces(self.expected_artifacts(inputs))
            .with_timeout(inputs.config.stage_timeout())
    }

    /// Returns true if this stage expects to write `path`.
    #[must_use]
    pub fn produces(&self, inputs: &StageInputs<'_>, path: &Path) -> bool {
        self.expected_artifacts(inputs).iter().any(|p| p == path)
    }
}

impl fmt::Debug for StageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StageDescriptor")
            .field("name", &self.name)
            .field("tool", &self.tool)
            .field("toolchain", &self.toolchain)
            .finish_non_exhaustive()
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolLocations;

    fn echo_args(inputs: &StageInputs<'_>) -> Vec<String> {
        vec!["-i".to_string(), inputs.layout.input_dir.to_string_lossy().into_owned()]
    }

    fn one_artifact(inputs: &StageInputs<'_>) -> Vec<PathBuf> {
        vec![inputs.layout.build("out.bin")]
    }

    const ECHO: StageDescriptor =
        StageDescriptor::new("echo", "echo_tool", Toolchain::Mvs, echo_args, one_artifact);

    #[test]
    fn test_invocation_resolves_program_and_artifacts() {
        let layout = fixtures::layout();
        let config = PipelineConfig::builder()
            .input_dir("/data/photos")
            .output_dir("/data/out")
            .stage_timeout_seconds(30.0)
            .locations(ToolLocations {
                sfm_bin_dir: None,
                mvs_bin_dir: Some(PathBuf::from("/opt/mvs")),
            })
            .build()
            .unwrap();

        let inv = ECHO.invocation(&StageInputs::new(&config, &layout));
        assert_eq!(inv.stage, "echo");
        assert_eq!(inv.program, PathBuf::from("/opt/mvs/echo_tool"));
        assert_eq!(inv.args, vec!["-i", "/data/photos"]);
        assert_eq!(inv.produces, vec![PathBuf::from("/data/out/build/out.bin")]);
        assert_eq!(inv.timeout, Some(std::time::Duration::from_secs(30)));
    }

    #[test]
    fn test_produces_lookup() {
        let layout = fixtures::layout();
        let config = fixtures::config();
        let inputs = StageInputs::new(&config, &layout);
        assert!(ECHO.produces(&inputs, Path::new("/data/out/build/out.bin")));
        assert!(!ECHO.produces(&inputs, Path::new("/data/out/build/other.bin")));
    }

    #[test]
    fn test_debug_omits_function_pointers() {
        let dbg = format!("{ECHO:?}");
        assert!(dbg.contains("echo_tool"));
    }
}
