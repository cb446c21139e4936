//! Invocation description and the command runner capability.

use crate::errors::ExternalToolError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// One external tool call, fully resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invocation {
    /// The stage issuing the call.
    pub stage: String,
    /// The program to execute.
    pub program: PathBuf,
    /// The ordered argument list.
    pub args: Vec<String>,
    /// Files the tool is expected to write.
    #[serde(default)]
    pub produces: Vec<PathBuf>,
    /// Kill the tool if it runs longer than this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<Duration>,
}

impl Invocation {
    /// Creates a new invocation.
    #[must_use]
    pub fn new(stage: impl Into<String>, program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            stage: stage.into(),
            program: program.into(),
            args,
            produces: Vec::new(),
            timeout: None,
        }
    }

    /// Sets the expected artifacts.
    #[must_use]
    pub fn with_produces(mut self, produces: Vec<PathBuf>) -> Self {
        self.produces = produces;
        self
    }

    /// Sets the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The program's file name, without any directory.
    #[must_use]
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map_or_else(|| self.program.to_string_lossy(), |n| n.to_string_lossy())
            .into_owned()
    }

    /// The program as a string, as it appears in error reports.
    #[must_use]
    pub fn program_display(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Executes external tools.
#[async_trait]
pub trait CommandRunner: Send + Sync + fmt::Debug {
    /// Runs the invocation to completion.
    ///
    /// Succeeds only when the process exits with status 0.
    async fn run(&self, invocation: &Invocation) -> Result<(), ExternalToolError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_is_command_line() {
        let inv = Invocation::new(
            "reconstruct_mesh",
            "ReconstructMesh",
            vec!["scene_dense.mvs".into(), "-o".into(), "scene_mesh.ply".into()],
        );
        assert_eq!(inv.to_string(), "ReconstructMesh scene_dense.mvs -o scene_mesh.ply");
    }

    #[test]
    fn test_tool_name_strips_directory() {
        let inv = Invocation::new("texture_mesh", "/opt/mvs/bin/TextureMesh", Vec::new());
        assert_eq!(inv.tool_name(), "TextureMesh");
        assert_eq!(inv.program_display(), "/opt/mvs/bin/TextureMesh");
    }

    #[test]
    fn test_serialize_skips_missing_timeout() {
        let inv = Invocation::new("colorize", "openMVG_main_ComputeSfM_DataColor", Vec::new());
        let json = serde_json::to_value(&inv).unwrap();
        assert!(json.get("timeout").is_none());
        assert_eq!(json["stage"], "colorize");
    }
}
