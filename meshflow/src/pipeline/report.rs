//! Serializable summary of a finished run.

use crate::core::{Phase, RunState, StageOutcome};
use crate::errors::{IoError, PipelineError};
use crate::resources::CameraDatabase;
use crate::utils::Timestamp;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// The outcome of one executed stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageRecord {
    /// Zero-based position across both phases.
    pub index: usize,
    /// Stage name.
    pub name: String,
    /// Tool executable name.
    pub tool: String,
    /// Phase the stage belongs to.
    pub phase: Phase,
    /// Whether the tool succeeded.
    pub outcome: StageOutcome,
    /// Wall time of the invocation in milliseconds.
    pub duration_ms: f64,
}

/// Summary of a run, written by `--report`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run identifier.
    pub run_id: Uuid,
    /// Terminal state of the run.
    pub state: RunState,
    /// When the run started.
    pub started_at: Timestamp,
    /// When the run finished.
    pub finished_at: Timestamp,
    /// Every stage that was invoked, in order.
    pub stages: Vec<StageRecord>,
    /// Name of the last stage that completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_completed_stage: Option<String>,
    /// The camera database the run used and where it came from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_database: Option<CameraDatabase>,
    /// Files copied into the output directory.
    pub published: Vec<PathBuf>,
    /// Number of temporary resources removed.
    pub released: usize,
    /// Structured description of the failure, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<HashMap<String, Value>>,
}

impl RunReport {
    /// Returns true if the run completed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.state == RunState::Completed
    }

    /// Total wall time in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }

    /// Attaches a failure description.
    #[must_use]
    pub fn with_error(mut self, error: &PipelineError) -> Self {
        self.error = Some(error.to_dict());
        self
    }

    /// Writes the report as pretty-printed JSON.
    pub fn write_json(&self, path: &Path) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(self).map_err(|e| {
            IoError::new("serialize report", path, std::io::Error::other(e))
        })?;
        std::fs::write(path, json).map_err(|e| IoError::new("write report", path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConfigurationError;
    use crate::utils::now;

    fn report(state: RunState) -> RunReport {
        let started = now();
        RunReport {
            run_id: Uuid::new_v4(),
            state,
            started_at: started,
            finished_at: started + chrono::Duration::milliseconds(1500),
            stages: vec![StageRecord {
                index: 0,
                name: "image_listing".to_string(),
                tool: "openMVG_main_SfMInit_ImageListing".to_string(),
                phase: Phase::Sfm,
                outcome: StageOutcome::Completed,
                duration_ms: 12.5,
            }],
            last_completed_stage: Some("image_listing".to_string()),
            camera_database: None,
            published: Vec::new(),
            released: 2,
            error: None,
        }
    }

    #[test]
    fn test_succeeded_and_duration() {
        let r = report(RunState::Completed);
        assert!(r.succeeded());
        assert_eq!(r.duration_ms(), 1500);
        assert!(!report(RunState::Failed).succeeded());
    }

    #[test]
    fn test_serializes_state_and_error() {
        let err = PipelineError::from(ConfigurationError::new("bad").with_field("input_dir"));
        let r = report(RunState::Failed).with_error(&err);

        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["state"], "failed");
        assert_eq!(json["stages"][0]["outcome"], "completed");
        assert_eq!(json["error"]["type"], "ConfigurationError");
        assert_eq!(json["error"]["field"], "input_dir");
    }

    #[test]
    fn test_serializes_camera_database_provenance() {
        let mut r = report(RunState::Completed);
        assert!(serde_json::to_value(&r).unwrap().get("camera_database").is_none());

        r.camera_database = Some(CameraDatabase::downloaded("/tmp/meshflow-camera-db-1/sensors.txt"));
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["camera_database"]["provenance"], "downloaded");
        assert_eq!(
            json["camera_database"]["path"],
            "/tmp/meshflow-camera-db-1/sensors.txt"
        );
    }

    #[test]
    fn test_write_json_round_trips() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("report.json");
        let r = report(RunState::Completed);

        r.write_json(&path).unwrap();
        let back: RunReport = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(back.run_id, r.run_id);
        assert_eq!(back.stages, r.stages);
    }
}
