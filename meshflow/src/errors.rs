//! Error types for the meshflow pipeline.
//!
//! Every failure aborts the enclosing run. The variants of [`PipelineError`]
//! distinguish configuration mistakes, external tool failures, local I/O
//! failures and downloads so the caller can report which stage failed and why.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The configuration was rejected before any tool ran.
    #[error("{0}")]
    Configuration(#[from] ConfigurationError),

    /// An external tool could not be launched or exited unsuccessfully.
    #[error("{0}")]
    ExternalTool(#[from] ExternalToolError),

    /// A local filesystem operation failed.
    #[error("{0}")]
    Io(#[from] IoError),

    /// A remote resource could not be fetched.
    #[error("{0}")]
    Download(#[from] DownloadError),

    /// A stage exited successfully but an expected artifact is missing.
    #[error("Stage '{stage}' did not produce expected artifact {}", .path.display())]
    MissingArtifact {
        /// The stage name.
        stage: String,
        /// The missing artifact path.
        path: PathBuf,
    },

    /// The run was cancelled between stages.
    #[error("Pipeline cancelled: {0}")]
    Cancelled(String),
}

impl PipelineError {
    /// Returns a short, stable name for the error class.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "ConfigurationError",
            Self::ExternalTool(_) => "ExternalToolError",
            Self::Io(_) => "IOError",
            Self::Download(_) => "DownloadError",
            Self::MissingArtifact { .. } => "MissingArtifactError",
            Self::Cancelled(_) => "CancelledError",
        }
    }

    /// Returns the stage the error is attributed to, if any.
    #[must_use]
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::ExternalTool(err) => Some(&err.stage),
            Self::MissingArtifact { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, Value> {
        let mut map = match self {
            Self::ExternalTool(err) => err.to_dict(),
            Self::Download(err) => err.to_dict(),
            Self::Io(err) => {
                let mut map = HashMap::new();
                map.insert("operation".to_string(), json!(err.operation));
                map.insert("path".to_string(), json!(err.path.display().to_string()));
                map
            }
            Self::Configuration(err) => {
                let mut map = HashMap::new();
                if let Some(ref field) = err.field {
                    map.insert("field".to_string(), json!(field));
                }
                map
            }
            Self::MissingArtifact { stage, path } => {
                let mut map = HashMap::new();
                map.insert("stage".to_string(), json!(stage));
                map.insert("path".to_string(), json!(path.display().to_string()));
                map
            }
            Self::Cancelled(_) => HashMap::new(),
        };

        map.insert("type".to_string(), json!(self.kind()));
        map.insert("message".to_string(), json!(self.to_string()));
        map
    }
}

/// Error raised when the pipeline configuration is invalid.
#[derive(Debug, Clone, Error)]
#[error("Configuration error: {message}")]
pub struct ConfigurationError {
    /// The error message.
    pub message: String,
    /// The offending configuration field.
    pub field: Option<String>,
}

impl ConfigurationError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
        }
    }

    /// Sets the offending field.
    #[must_use]
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }
}

/// Why an external tool invocation failed.
#[derive(Debug, Error)]
pub enum ToolFailure {
    /// The process exited with a non-zero status, or was killed by a signal.
    #[error("{}", exit_message(.code))]
    Exit {
        /// The exit code, if the process exited normally.
        code: Option<i32>,
    },

    /// The process could not be started.
    #[error("failed to launch: {0}")]
    Launch(#[source] std::io::Error),

    /// Waiting for the process failed after it started.
    #[error("failed while waiting: {0}")]
    Wait(#[source] std::io::Error),

    /// The process exceeded the per-stage timeout and was killed.
    #[error("timed out after {seconds}s")]
    Timeout {
        /// The timeout that elapsed.
        seconds: f64,
    },
}

fn exit_message(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Error raised when a stage's subprocess fails.
#[derive(Debug, Error)]
#[error("Stage '{stage}' failed: {program} {}: {reason}", .args.join(" "))]
pub struct ExternalToolError {
    /// The stage that ran the tool.
    pub stage: String,
    /// The program that was invoked.
    pub program: String,
    /// The full argument list.
    pub args: Vec<String>,
    /// The underlying failure.
    #[source]
    pub reason: ToolFailure,
}

impl ExternalToolError {
    /// Creates a new external tool error.
    #[must_use]
    pub fn new(
        stage: impl Into<String>,
        program: impl Into<String>,
        args: Vec<String>,
        reason: ToolFailure,
    ) -> Self {
        Self {
            stage: stage.into(),
            program: program.into(),
            args,
            reason,
        }
    }

    /// Returns the exit code, if the tool ran and exited with one.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self.reason {
            ToolFailure::Exit { code } => code,
            _ => None,
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("stage".to_string(), json!(self.stage));
        map.insert("program".to_string(), json!(self.program));
        map.insert("args".to_string(), json!(self.args));
        map.insert("reason".to_string(), json!(self.reason.to_string()));
        if let Some(code) = self.exit_code() {
            map.insert("exit_code".to_string(), json!(code));
        }
        map
    }
}

/// Error raised when a filesystem operation fails.
#[derive(Debug, Error)]
#[error("IO error: failed to {operation} {}: {source}", .path.display())]
pub struct IoError {
    /// The operation that failed (e.g. "create directory").
    pub operation: String,
    /// The path involved.
    pub path: PathBuf,
    /// The underlying error.
    #[source]
    pub source: std::io::Error,
}

impl IoError {
    /// Creates a new IO error.
    #[must_use]
    pub fn new(operation: impl Into<String>, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self {
            operation: operation.into(),
            path: path.into(),
            source,
        }
    }
}

/// Error raised when a resource download fails.
#[derive(Debug, Clone, Error)]
#[error("Download failed for {url}: {reason}")]
pub struct DownloadError {
    /// The requested URL.
    pub url: String,
    /// Why the download failed.
    pub reason: String,
    /// The HTTP status, when the server answered.
    pub status: Option<u16>,
}

impl DownloadError {
    /// Creates a new download error.
    #[must_use]
    pub fn new(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            reason: reason.into(),
            status: None,
        }
    }

    /// Creates an error for a non-success HTTP status.
    #[must_use]
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            reason: format!("server returned status code {status}"),
            status: Some(status),
        }
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, Value> {
        let mut map = HashMap::new();
        map.insert("url".to_string(), json!(self.url));
        map.insert("reason".to_string(), json!(self.reason));
        if let Some(status) = self.status {
            map.insert("status".to_string(), json!(status));
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tool_error(reason: ToolFailure) -> ExternalToolError {
        ExternalToolError::new(
            "densify_point_cloud",
            "DensifyPointCloud",
            vec!["scene.mvs".to_string(), "-o".to_string(), "scene_dense.mvs".to_string()],
            reason,
        )
    }

    #[test]
    fn test_external_tool_error_message_names_stage_and_args() {
        let err = tool_error(ToolFailure::Exit { code: Some(3) });
        let msg = err.to_string();

        assert!(msg.contains("densify_point_cloud"));
        assert!(msg.contains("DensifyPointCloud scene.mvs -o scene_dense.mvs"));
        assert!(msg.contains("exited with status 3"));
        assert_eq!(err.exit_code(), Some(3));
    }

    #[test]
    fn test_external_tool_error_launch_keeps_source() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = tool_error(ToolFailure::Launch(io));

        assert!(err.exit_code().is_none());
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.to_string().contains("no such file"));
    }

    #[test]
    fn test_signal_exit_message() {
        let err = tool_error(ToolFailure::Exit { code: None });
        assert!(err.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_pipeline_error_kind_and_stage() {
        let err = PipelineError::from(tool_error(ToolFailure::Timeout { seconds: 5.0 }));
        assert_eq!(err.kind(), "ExternalToolError");
        assert_eq!(err.stage(), Some("densify_point_cloud"));

        let err = PipelineError::from(ConfigurationError::new("input directory must be specified"));
        assert_eq!(err.kind(), "ConfigurationError");
        assert!(err.stage().is_none());
    }

    #[test]
    fn test_pipeline_error_to_dict() {
        let err = PipelineError::from(tool_error(ToolFailure::Exit { code: Some(1) }));
        let dict = err.to_dict();

        assert_eq!(dict.get("type").unwrap(), "ExternalToolError");
        assert_eq!(dict.get("stage").unwrap(), "densify_point_cloud");
        assert_eq!(dict.get("exit_code").unwrap(), 1);
    }

    #[test]
    fn test_configuration_error_field() {
        let err = ConfigurationError::new("output directory must be specified").with_field("output_dir");
        let dict = PipelineError::from(err).to_dict();
        assert_eq!(dict.get("field").unwrap(), "output_dir");
    }

    #[test]
    fn test_download_error_status() {
        let err = DownloadError::status("https://example.com/db.txt", 404);
        assert_eq!(err.status, Some(404));
        assert!(err.to_string().contains("404"));
        assert_eq!(err.to_dict().get("status").unwrap(), 404);
    }

    #[test]
    fn test_io_error_display() {
        let err = IoError::new(
            "create directory",
            "/nope/out",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("create directory"));
        assert!(msg.contains("/nope/out"));
    }
}
