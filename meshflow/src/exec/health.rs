//! Toolchain availability check.

use crate::config::PipelineConfig;
use crate::stages::{mvs_stages, sfm_stages};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// A stage whose tool could not be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MissingTool {
    /// The stage needing the tool.
    pub stage: String,
    /// The program that was looked up.
    pub program: PathBuf,
}

/// Reports every stage tool that is neither in its configured bin directory
/// nor on `PATH`. An empty result means the whole pipeline can launch.
#[must_use]
pub fn check_toolchain(config: &PipelineConfig) -> Vec<MissingTool> {
    let path_var = std::env::var_os("PATH");
    let search: Vec<PathBuf> = path_var
        .as_ref()
        .map(|p| std::env::split_paths(p).collect())
        .unwrap_or_default();

    sfm_stages()
        .into_iter()
        .chain(mvs_stages())
        .filter_map(|stage| {
            let program = config.locations().resolve(stage.toolchain, stage.tool);
            if is_available(&program, &search) {
                None
            } else {
                Some(MissingTool {
                    stage: stage.name.to_string(),
                    program,
                })
            }
        })
        .collect()
}

fn is_available(program: &Path, search: &[PathBuf]) -> bool {
    if program.components().count() > 1 {
        return program.is_file();
    }
    search.iter().any(|dir| dir.join(program).is_file())
}
