//! Lifecycle events emitted by a pipeline run.
//!
//! The runner reports run, stage and resource lifecycle changes to an
//! [`EventSink`]. Sinks never fail the run.

mod sink;

pub use sink::{CollectingEventSink, EventSink, LoggingEventSink, NoOpEventSink};

/// Event type names emitted by the runner.
pub mod kinds {
    /// A run began.
    pub const RUN_STARTED: &str = "run.started";
    /// The run moved to a new state.
    pub const RUN_STATE_CHANGED: &str = "run.state_changed";
    /// A run finished successfully.
    pub const RUN_COMPLETED: &str = "run.completed";
    /// A run failed.
    pub const RUN_FAILED: &str = "run.failed";
    /// A stage is about to invoke its tool.
    pub const STAGE_STARTED: &str = "stage.started";
    /// A stage's tool exited successfully.
    pub const STAGE_COMPLETED: &str = "stage.completed";
    /// A stage failed.
    pub const STAGE_FAILED: &str = "stage.failed";
    /// A temporary resource was created.
    pub const RESOURCE_ACQUIRED: &str = "resource.acquired";
    /// A temporary resource was removed.
    pub const RESOURCE_RELEASED: &str = "resource.released";
    /// A final artifact was copied to the output directory.
    pub const ARTIFACT_PUBLISHED: &str = "artifact.published";
}
