//! Runs an ordered stage list, one tool at a time.

use super::report::StageRecord;
use super::run::PipelineRun;
use crate::cancellation::CancellationToken;
use crate::core::{Phase, StageOutcome};
use crate::errors::PipelineError;
use crate::events::{kinds, EventSink};
use crate::exec::Invocation;
use crate::observability::SpanTimer;
use crate::resources::Capabilities;
use crate::stages::{mvs_stages, sfm_stages, StageDescriptor, StageInputs};
use serde_json::json;
use tracing::{error, info};

/// What a sequencer needs from the surrounding run.
#[derive(Clone, Copy)]
pub struct SequencerContext<'a> {
    /// Capabilities used to run tools and check artifacts.
    pub caps: &'a Capabilities,
    /// Receives stage events.
    pub sink: &'a dyn EventSink,
    /// Checked before each stage.
    pub cancel: &'a CancellationToken,
}

/// An ordered list of stages belonging to one phase.
#[derive(Debug, Clone)]
pub struct StageSequencer {
    phase: Phase,
    offset: usize,
    stages: Vec<StageDescriptor>,
}

impl StageSequencer {
    /// Creates a sequencer whose first stage has the global index `offset`.
    #[must_use]
    pub fn new(phase: Phase, offset: usize, stages: Vec<StageDescriptor>) -> Self {
        Self {
            phase,
            offset,
            stages,
        }
    }

    /// The structure-from-motion sequencer, including export to MVS.
    #[must_use]
    pub fn sfm() -> Self {
        Self::new(Phase::Sfm, 0, sfm_stages())
    }

    /// The multi-view stereo sequencer. Its indices follow the SfM stages.
    #[must_use]
    pub fn mvs() -> Self {
        Self::new(Phase::Mvs, sfm_stages().len(), mvs_stages())
    }

    /// The phase this sequencer runs.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The stages in execution order.
    #[must_use]
    pub fn stages(&self) -> &[StageDescriptor] {
        &self.stages
    }

    /// The stage names in execution order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name).collect()
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Returns true if there are no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Resolves every invocation without executing anything.
    #[must_use]
    pub fn plan(&self, inputs: &StageInputs<'_>) -> Vec<Invocation> {
        self.stages.iter().map(|s| s.invocation(inputs)).collect()
    }

    /// Runs the stages in order, aborting on the first failure.
    ///
    /// Cancellation is observed before each stage. A failed stage is recorded
    /// on the run before its error is returned.
    pub async fn run(
        &self,
        inputs: &StageInputs<'_>,
        ctx: SequencerContext<'_>,
        run: &mut PipelineRun,
    ) -> Result<(), PipelineError> {
        for (position, stage) in self.stages.iter().enumerate() {
            let index = self.offset + position;
            check_cancelled(ctx.cancel)?;

            let invocation = stage.invocation(inputs);
            ctx.sink.try_emit(
                kinds::STAGE_STARTED,
                Some(json!({
                    "run_id": run.run_id().to_string(),
                    "stage": stage.name,
                    "index": index,
                    "phase": self.phase,
                    "tool": stage.tool,
                })),
            );

            let timer = SpanTimer::start(stage.name);
            let result = match ctx.caps.runner.run(&invocation).await {
                Ok(()) if inputs.config.verify_artifacts() => verify_artifacts(&invocation, ctx.caps),
                Ok(()) => Ok(()),
                Err(e) => Err(PipelineError::from(e)),
            };
            let duration_ms = timer.finish();

            let outcome = if result.is_ok() {
                StageOutcome::Completed
            } else {
                StageOutcome::Failed
            };
            run.record_stage(StageRecord {
                index,
                name: stage.name.to_string(),
                tool: stage.tool.to_string(),
                phase: self.phase,
                outcome,
                duration_ms,
            });

            if let Err(err) = result {
                error!(stage = stage.name, index, error = %err, "Stage failed");
                ctx.sink.try_emit(
                    kinds::STAGE_FAILED,
                    Some(json!({
                        "run_id": run.run_id().to_string(),
                        "stage": stage.name,
                        "index": index,
                        "duration_ms": duration_ms,
                        "error": err.to_dict(),
                    })),
                );
                return Err(err);
            }

            for path in &invocation.produces {
                run.artifacts.record(stage.name, path.clone());
            }
            info!(stage = stage.name, index, duration_ms, "Stage completed");
            ctx.sink.try_emit(
                kinds::STAGE_COMPLETED,
                Some(json!({
                    "run_id": run.run_id().to_string(),
                    "stage": stage.name,
                    "index": index,
                    "duration_ms": duration_ms,
                })),
            );
        }

        Ok(())
    }
}

/// Fails with `Cancelled` if the token has been tripped.
pub(crate) fn check_cancelled(cancel: &CancellationToken) -> Result<(), PipelineError> {
    if cancel.is_cancelled() {
        let reason = cancel.reason().unwrap_or_else(|| "cancelled".to_string());
        return Err(PipelineError::Cancelled(reason));
    }
    Ok(())
}

fn verify_artifacts(invocation: &Invocation, caps: &Capabilities) -> Result<(), PipelineError> {
    match invocation.produces.iter().find(|p| !caps.fs.exists(p)) {
        Some(path) => Err(PipelineError::MissingArtifact {
            stage: invocation.stage.clone(),
            path: path.clone(),
        }),
        None => Ok(()),
    }
}
