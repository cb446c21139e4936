//! Mutable state of one pipeline execution.

use super::report::{RunReport, StageRecord};
use crate::core::{ArtifactSet, RunState, StageOutcome};
use crate::events::{kinds, EventSink};
use crate::resources::{CameraDatabase, TempResourceSet};
use crate::utils::{generate_uuid, now, Timestamp};
use serde_json::json;
use std::path::PathBuf;
use tracing::{info, warn};
use uuid::Uuid;

/// One execution of the pipeline.
///
/// Created per invocation and dropped at the end of it. Owns the temporary
/// resources acquired on its behalf.
#[derive(Debug)]
pub struct PipelineRun {
    run_id: Uuid,
    state: RunState,
    started_at: Timestamp,
    pub(crate) resources: TempResourceSet,
    pub(crate) camera_database: Option<CameraDatabase>,
    pub(crate) records: Vec<StageRecord>,
    pub(crate) artifacts: ArtifactSet,
    pub(crate) published: Vec<PathBuf>,
    last_completed_stage: Option<usize>,
}

impl Default for PipelineRun {
    fn default() -> Self {
        Self::new()
    }
}

impl PipelineRun {
    /// Creates a run in the `Idle` state with a fresh id.
    #[must_use]
    pub fn new() -> Self {
        Self {
            run_id: generate_uuid(),
            state: RunState::Idle,
            started_at: now(),
            resources: TempResourceSet::new(),
            camera_database: None,
            records: Vec::new(),
            artifacts: ArtifactSet::new(),
            published: Vec::new(),
            last_completed_stage: None,
        }
    }

    /// The run identifier.
    #[must_use]
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// The current state.
    #[must_use]
    pub fn state(&self) -> RunState {
        self.state
    }

    /// The recorded stages so far.
    #[must_use]
    pub fn records(&self) -> &[StageRecord] {
        &self.records
    }

    /// Artifacts recorded by completed stages.
    #[must_use]
    pub fn artifacts(&self) -> &ArtifactSet {
        &self.artifacts
    }

    /// The camera database in use, once resolved.
    #[must_use]
    pub fn camera_database(&self) -> Option<&CameraDatabase> {
        self.camera_database.as_ref()
    }

    /// Index of the last stage that completed, across both phases.
    #[must_use]
    pub fn last_completed_stage(&self) -> Option<usize> {
        self.last_completed_stage
    }

    /// Moves to `next`, emitting a state change event.
    ///
    /// Returns false and leaves the state unchanged if the transition is not
    /// allowed.
    pub fn transition(&mut self, next: RunState, sink: &dyn EventSink) -> bool {
        if !self.state.can_transition_to(next) {
            warn!(run_id = %self.run_id, from = %self.state, to = %next, "Rejected state transition");
            return false;
        }

        let previous = self.state;
        self.state = next;
        info!(run_id = %self.run_id, from = %previous, to = %next, "Run state changed");
        sink.try_emit(
            kinds::RUN_STATE_CHANGED,
            Some(json!({
                "run_id": self.run_id.to_string(),
                "from": previous,
                "to": next,
            })),
        );
        true
    }

    /// Records a finished stage.
    pub(crate) fn record_stage(&mut self, record: StageRecord) {
        if record.outcome == StageOutcome::Completed {
            self.last_completed_stage = Some(record.index);
        }
        self.records.push(record);
    }

    /// Builds the report for the run in its current state.
    #[must_use]
    pub fn report(&self, released: usize) -> RunReport {
        RunReport {
            run_id: self.run_id,
            state: self.state,
            started_at: self.started_at,
            finished_at: now(),
            stages: self.records.clone(),
            last_completed_stage: self
                .last_completed_stage
                .and_then(|i| self.records.iter().find(|r| r.index == i))
                .map(|r| r.name.clone()),
            camera_database: self.camera_database.clone(),
            published: self.published.clone(),
            released,
            error: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Phase;
    use crate::events::CollectingEventSink;

    fn record(index: usize, outcome: StageOutcome) -> StageRecord {
        StageRecord {
            index,
            name: format!("stage_{index}"),
            tool: "tool".to_string(),
            phase: Phase::Sfm,
            outcome,
            duration_ms: 1.0,
        }
    }

    #[test]
    fn test_valid_transitions_emit_events() {
        let sink = CollectingEventSink::new();
        let mut run = PipelineRun::new();

        assert!(run.transition(RunState::Validating, &sink));
        assert!(run.transition(RunState::RunningSfm, &sink));
        assert_eq!(run.state(), RunState::RunningSfm);

        let events = sink.events_of_type(kinds::RUN_STATE_CHANGED);
        assert_eq!(events.len(), 2);
        let data = events[1].1.as_ref().unwrap();
        assert_eq!(data["from"], "validating");
        assert_eq!(data["to"], "running_sfm");
    }

    #[test]
    fn test_invalid_transition_is_rejected() {
        let sink = CollectingEventSink::new();
        let mut run = PipelineRun::new();

        assert!(!run.transition(RunState::Completed, &sink));
        assert_eq!(run.state(), RunState::Idle);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_last_completed_stage_tracks_successes() {
        let mut run = PipelineRun::new();
        run.record_stage(record(0, StageOutcome::Completed));
        run.record_stage(record(1, StageOutcome::Completed));
        run.record_stage(record(2, StageOutcome::Failed));

        assert_eq!(run.last_completed_stage(), Some(1));
        let report = run.report(0);
        assert_eq!(report.last_completed_stage.as_deref(), Some("stage_1"));
        assert_eq!(report.stages.len(), 3);
    }
}
