//! Top-level controller of a pipeline run.

use super::handoff::ArtifactHandoff;
use super::report::RunReport;
use super::run::PipelineRun;
use super::sequencer::{check_cancelled, SequencerContext, StageSequencer};
use crate::cancellation::CancellationToken;
use crate::config::{require_utf8, PipelineConfig};
use crate::core::RunState;
use crate::errors::{ConfigurationError, PipelineError};
use crate::events::{kinds, EventSink, NoOpEventSink};
use crate::exec::Invocation;
use crate::resources::{file_name_from_url, CameraDatabase, Capabilities, DirectoryManager};
use crate::stages::{RunLayout, StageInputs};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info};

const MATCHES_LABEL: &str = "matches";
const RECONSTRUCTION_LABEL: &str = "reconstruction";
const CAMERA_DB_LABEL: &str = "camera-db";

/// The result of [`PipelineRunner::execute`]: a report in every case and
/// the error that ended the run, if any.
#[derive(Debug)]
pub struct RunOutcome {
    /// Summary of the run.
    pub report: RunReport,
    /// The error that failed the run.
    pub error: Option<PipelineError>,
}

impl RunOutcome {
    /// Returns true if the run completed.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Converts into a `Result`, dropping the report on failure.
    pub fn into_result(self) -> Result<RunReport, PipelineError> {
        match self.error {
            None => Ok(self.report),
            Some(err) => Err(err),
        }
    }
}

/// Drives one run: validation, resource acquisition, SfM, MVS, handoff and
/// release.
pub struct PipelineRunner {
    config: PipelineConfig,
    caps: Capabilities,
    directories: DirectoryManager,
    sink: Arc<dyn EventSink>,
}

impl std::fmt::Debug for PipelineRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PipelineRunner")
            .field("config", &self.config)
            .field("caps", &self.caps)
            .finish_non_exhaustive()
    }
}

impl PipelineRunner {
    /// Creates a runner for `config` using `caps` for all side effects.
    #[must_use]
    pub fn new(config: PipelineConfig, caps: Capabilities) -> Self {
        let directories = DirectoryManager::new(caps.fs.clone(), config.temp_root());
        Self {
            config,
            caps,
            directories,
            sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the sink receiving lifecycle events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = sink;
        self
    }

    /// The run configuration.
    #[must_use]
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Resolves all twelve invocations without touching the filesystem.
    ///
    /// Temporary directories appear under the temp root with a `<run>`
    /// placeholder in place of the unique token.
    #[must_use]
    pub fn plan(&self) -> Vec<Invocation> {
        let camera_database = self.config.camera_database().map_or_else(
            || {
                self.directories
                    .temporary_path(CAMERA_DB_LABEL, "<run>")
                    .join(file_name_from_url(&self.config.parameters().camera_database_url))
            },
            std::path::Path::to_path_buf,
        );
        let layout = RunLayout {
            input_dir: self.config.input_dir().to_path_buf(),
            output_dir: self.config.output_dir().to_path_buf(),
            build_dir: self.config.build_dir().to_path_buf(),
            matches_dir: self.directories.temporary_path(MATCHES_LABEL, "<run>"),
            reconstruction_dir: self.directories.temporary_path(RECONSTRUCTION_LABEL, "<run>"),
            camera_database,
        };
        let inputs = StageInputs::new(&self.config, &layout);

        let mut plan = StageSequencer::sfm().plan(&inputs);
        plan.extend(StageSequencer::mvs().plan(&inputs));
        plan
    }

    /// Runs the pipeline and returns the report, or the error that failed it.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<RunReport, PipelineError> {
        self.execute(cancel).await.into_result()
    }

    /// Runs the pipeline and always returns a report.
    ///
    /// Temporary resources acquired by the run are released before this
    /// returns, on success, failure and cancellation alike.
    pub async fn execute(&self, cancel: &CancellationToken) -> RunOutcome {
        let mut run = PipelineRun::new();
        info!(
            run_id = %run.run_id(),
            input = %self.config.input_dir().display(),
            output = %self.config.output_dir().display(),
            "Starting pipeline run"
        );
        self.sink.try_emit(
            kinds::RUN_STARTED,
            Some(json!({
                "run_id": run.run_id().to_string(),
                "input_dir": self.config.input_dir().display().to_string(),
                "output_dir": self.config.output_dir().display().to_string(),
            })),
        );

        let result = self.drive(&mut run, cancel).await;
        if result.is_err() {
            run.transition(RunState::Failed, self.sink.as_ref());
        }

        let summary = run.resources.release_all(&self.directories);
        for path in &summary.released {
            self.sink.try_emit(
                kinds::RESOURCE_RELEASED,
                Some(json!({
                    "run_id": run.run_id().to_string(),
                    "path": path.display().to_string(),
                })),
            );
        }

        let report = run.report(summary.released.len());
        match result {
            Ok(()) => {
                info!(run_id = %run.run_id(), duration_ms = report.duration_ms(), "Pipeline completed");
                self.sink.try_emit(
                    kinds::RUN_COMPLETED,
                    Some(json!({
                        "run_id": run.run_id().to_string(),
                        "published": report.published,
                    })),
                );
                RunOutcome {
                    report,
                    error: None,
                }
            }
            Err(err) => {
                error!(run_id = %run.run_id(), error = %err, "Pipeline failed");
                self.sink.try_emit(
                    kinds::RUN_FAILED,
                    Some(json!({
                        "run_id": run.run_id().to_string(),
                        "error": err.to_dict(),
                    })),
                );
                RunOutcome {
                    report: report.with_error(&err),
                    error: Some(err),
                }
            }
        }
    }

    async fn drive(&self, run: &mut PipelineRun, cancel: &CancellationToken) -> Result<(), PipelineError> {
        let sink = self.sink.as_ref();

        run.transition(RunState::Validating, sink);
        let input_dir = self.ensure_directory(self.config.input_dir(), "input_dir")?;
        let output_dir = self.ensure_directory(self.config.output_dir(), "output_dir")?;
        let build_dir = self.ensure_directory(self.config.build_dir(), "build_dir")?;

        let camera_database = self.resolve_camera_database(run).await?;
        let matches_dir = self.acquire(run, MATCHES_LABEL)?;
        let reconstruction_dir = self.acquire(run, RECONSTRUCTION_LABEL)?;

        let layout = RunLayout {
            input_dir,
            output_dir,
            build_dir,
            matches_dir,
            reconstruction_dir,
            camera_database,
        };
        let inputs = StageInputs::new(&self.config, &layout);
        let ctx = SequencerContext {
            caps: &self.caps,
            sink,
            cancel,
        };

        for sequencer in [StageSequencer::sfm(), StageSequencer::mvs()] {
            run.transition(sequencer.phase().run_state(), sink);
            sequencer.run(&inputs, ctx, run).await?;
        }

        check_cancelled(cancel)?;
        run.transition(RunState::Finalizing, sink);
        run.published = ArtifactHandoff::new()
            .with_format(self.config.parameters().texture_export_type)
            .with_publish_sparse(self.config.publish_sparse())
            .publish(&layout, self.caps.fs.as_ref(), sink)?;

        run.transition(RunState::Completed, sink);
        Ok(())
    }

    /// Uses the caller's database, or downloads one into a run-owned
    /// temporary directory.
    async fn resolve_camera_database(&self, run: &mut PipelineRun) -> Result<PathBuf, PipelineError> {
        let database = match self.config.camera_database() {
            Some(path) => CameraDatabase::user_supplied(path),
            None => {
                let dir = self.acquire(run, CAMERA_DB_LABEL)?;
                let url = &self.config.parameters().camera_database_url;
                info!(url = %url, "No camera database supplied, fetching default");
                CameraDatabase::downloaded(self.caps.provider.fetch(url, &dir).await?)
            }
        };

        info!(
            path = %database.path().display(),
            provenance = ?database.provenance(),
            "Using camera database"
        );
        let path = database.path().to_path_buf();
        run.camera_database = Some(database);
        Ok(path)
    }

    /// Creates a configured directory, rejecting a path held by a file.
    fn ensure_directory(&self, path: &Path, field: &str) -> Result<PathBuf, PipelineError> {
        if self.caps.fs.exists(path) && !self.caps.fs.is_dir(path) {
            return Err(ConfigurationError::new(format!(
                "{} exists and is not a directory",
                path.display()
            ))
            .with_field(field)
            .into());
        }
        let resolved = self.directories.ensure_persistent(path)?;
        require_utf8(&resolved, field)?;
        Ok(resolved)
    }

    fn acquire(&self, run: &mut PipelineRun, label: &str) -> Result<PathBuf, PipelineError> {
        let resource = self.directories.acquire_temporary(label)?;
        let path = resource.path().to_path_buf();
        run.resources.push(resource);

        self.sink.try_emit(
            kinds::RESOURCE_ACQUIRED,
            Some(json!({
                "run_id": run.run_id().to_string(),
                "label": label,
                "path": path.display().to_string(),
            })),
        );
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolLocations;
    use crate::resources::LocalFileSystem;
    use crate::testing::{RecordingCommandRunner, StaticResourceProvider};
    use std::path::Path;

    fn caps() -> Capabilities {
        Capabilities::new(
            Arc::new(RecordingCommandRunner::new()),
            Arc::new(LocalFileSystem::new()),
            Arc::new(StaticResourceProvider::new("sensors.txt", "db")),
        )
    }

    #[test]
    fn test_plan_uses_placeholders_and_bin_dirs() {
        let config = PipelineConfig::builder()
            .input_dir("/data/photos")
            .output_dir("/data/out")
            .temp_root("/scratch")
            .locations(ToolLocations {
                sfm_bin_dir: Some(PathBuf::from("/opt/openmvg/bin")),
                mvs_bin_dir: None,
            })
            .build()
            .unwrap();
        let plan = PipelineRunner::new(config, caps()).plan();

        assert_eq!(plan.len(), 12);
        assert_eq!(
            plan[0].program,
            Path::new("/opt/openmvg/bin/openMVG_main_SfMInit_ImageListing")
        );
        assert_eq!(plan[0].args[3], "/scratch/meshflow-matches-<run>");
        assert_eq!(
            plan[0].args[5],
            "/scratch/meshflow-camera-db-<run>/sensor_width_camera_database.txt"
        );
        assert_eq!(plan[8].program, Path::new("DensifyPointCloud"));
    }

    #[test]
    fn test_plan_uses_supplied_camera_database() {
        let config = PipelineConfig::builder()
            .input_dir("/data/photos")
            .output_dir("/data/out")
            .camera_database("/data/sensors.txt")
            .build()
            .unwrap();
        let plan = PipelineRunner::new(config, caps()).plan();

        assert_eq!(plan[0].args[5], "/data/sensors.txt");
    }

    #[test]
    fn test_outcome_into_result() {
        let report = PipelineRun::new().report(0);
        let outcome = RunOutcome {
            report,
            error: Some(PipelineError::Cancelled("stop".to_string())),
        };
        assert!(!outcome.succeeded());
        assert!(matches!(outcome.into_result(), Err(PipelineError::Cancelled(_))));
    }
}
