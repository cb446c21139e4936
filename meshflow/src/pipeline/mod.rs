//! Pipeline execution.
//!
//! [`PipelineRunner`] validates the configuration, acquires the run's
//! temporary directories, drives the SfM and MVS [`StageSequencer`]s, hands
//! the textured mesh off to the output directory and releases everything it
//! acquired, whatever the outcome.

mod handoff;
mod report;
mod run;
mod runner;
mod sequencer;


pub use handoff::ArtifactHandoff;
pub use report::{RunReport, StageRecord};
pub use run::PipelineRun;
pub use runner::{PipelineRunner, RunOutcome};
pub use sequencer::{SequencerContext, StageSequencer};
