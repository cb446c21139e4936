//! Recording capability doubles.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::cancellation::CancellationToken;
use crate::errors::{DownloadError, ExternalToolError, IoError, ToolFailure};
use crate::exec::{CommandRunner, Invocation};
use crate::resources::{FileSystem, LocalFileSystem, ResourceProvider};

/// A command runner that records every invocation instead of spawning it.
///
/// Stages can be scripted to fail with an exit code, to write extra files,
/// or to trip a cancellation token once they finish.
#[derive(Debug, Default)]
pub struct RecordingCommandRunner {
    invocations: Mutex<Vec<Invocation>>,
    failures: HashMap<String, i32>,
    extra_writes: HashMap<String, Vec<PathBuf>>,
    materialize: bool,
    cancel_after: Option<(String, Arc<CancellationToken>)>,
}

impl RecordingCommandRunner {
    /// Creates a runner where every stage succeeds without writing anything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Writes each invocation's expected artifacts on success.
    #[must_use]
    pub fn materializing(mut self) -> Self {
        self.materialize = true;
        self
    }

    /// Makes `stage` exit with `code`.
    #[must_use]
    pub fn fail_on(mut self, stage: impl Into<String>, code: i32) -> Self {
        self.failures.insert(stage.into(), code);
        self
    }

    /// Makes `stage` write `path` before it succeeds or fails.
    #[must_use]
    pub fn writes(mut self, stage: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.extra_writes.entry(stage.into()).or_default().push(path.into());
        self
    }

    /// Cancels `token` once `stage` has finished.
    #[must_use]
    pub fn cancel_after(mut self, stage: impl Into<String>, token: Arc<CancellationToken>) -> Self {
        self.cancel_after = Some((stage.into(), token));
        self
    }

    /// Returns every recorded invocation.
    #[must_use]
    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().clone()
    }

    /// Returns the recorded stage names in call order.
    #[must_use]
    pub fn stage_names(&self) -> Vec<String> {
        self.invocations.lock().iter().map(|i| i.stage.clone()).collect()
    }

    /// Returns the number of invocations.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.invocations.lock().len()
    }
}

fn write_marker(invocation: &Invocation, path: &Path) -> Result<(), ExternalToolError> {
    let fail = |e| {
        ExternalToolError::new(
            invocation.stage.clone(),
            invocation.program_display(),
            invocation.args.clone(),
            ToolFailure::Launch(e),
        )
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(fail)?;
    }
    std::fs::write(path, format!("{}\n", invocation.stage)).map_err(fail)
}

#[async_trait]
impl CommandRunner for RecordingCommandRunner {
    async fn run(&self, invocation: &Invocation) -> Result<(), ExternalToolError> {
        self.invocations.lock().push(invocation.clone());
        // A real child process wait yields to other runs.
        tokio::task::yield_now().await;

        for path in self.extra_writes.get(&invocation.stage).into_iter().flatten() {
            write_marker(invocation, path)?;
        }

        if let Some(&code) = self.failures.get(&invocation.stage) {
            return Err(ExternalToolError::new(
                invocation.stage.clone(),
                invocation.program_display(),
                invocation.args.clone(),
                ToolFailure::Exit { code: Some(code) },
            ));
        }

        if self.materialize {
            for path in &invocation.produces {
                write_marker(invocation, path)?;
            }
        }

        if let Some((stage, token)) = &self.cancel_after {
            if *stage == invocation.stage {
                token.cancel(format!("cancelled after {stage}"));
            }
        }

        Ok(())
    }
}

/// A local filesystem that records directory removals and file copies.
#[derive(Debug, Default)]
pub struct RecordingFileSystem {
    inner: LocalFileSystem,
    removed: Mutex<Vec<PathBuf>>,
    copies: Mutex<Vec<(PathBuf, PathBuf)>>,
}

impl RecordingFileSystem {
    /// Creates a recording filesystem.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Directories removed, in order.
    #[must_use]
    pub fn removed(&self) -> Vec<PathBuf> {
        self.removed.lock().clone()
    }

    /// Files copied, as `(source, destination)`.
    #[must_use]
    pub fn copies(&self) -> Vec<(PathBuf, PathBuf)> {
        self.copies.lock().clone()
    }
}

impl FileSystem for RecordingFileSystem {
    fn ensure_dir(&self, path: &Path) -> Result<PathBuf, IoError> {
        self.inner.ensure_dir(path)
    }

    fn create_dir(&self, path: &Path) -> Result<(), IoError> {
        self.inner.create_dir(path)
    }

    fn remove_dir_all(&self, path: &Path) -> Result<(), IoError> {
        self.removed.lock().push(path.to_path_buf());
        self.inner.remove_dir_all(path)
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> Result<u64, IoError> {
        self.copies.lock().push((src.to_path_buf(), dst.to_path_buf()));
        self.inner.copy_file(src, dst)
    }

    fn rename(&self, src: &Path, dst: &Path) -> Result<(), IoError> {
        self.inner.rename(src, dst)
    }

    fn remove_file(&self, path: &Path) -> Result<(), IoError> {
        self.inner.remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.is_dir(path)
    }
}

/// A resource provider that writes fixed contents instead of downloading.
#[derive(Debug)]
pub struct StaticResourceProvider {
    file_name: String,
    contents: String,
    calls: AtomicUsize,
    urls: Mutex<Vec<String>>,
}

impl StaticResourceProvider {
    /// Serves `contents` as `file_name`.
    #[must_use]
    pub fn new(file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            contents: contents.into(),
            calls: AtomicUsize::new(0),
            urls: Mutex::new(Vec::new()),
        }
    }

    /// Number of fetches.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// URLs requested, in order.
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

#[async_trait]
impl ResourceProvider for StaticResourceProvider {
    async fn fetch(&self, url: &str, dest_dir: &Path) -> Result<PathBuf, DownloadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.urls.lock().push(url.to_string());

        let path = dest_dir.join(&self.file_name);
        tokio::fs::write(&path, &self.contents)
            .await
            .map_err(|e| DownloadError::new(url, e.to_string()))?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_recording_runner_scripts_failures() {
        let runner = RecordingCommandRunner::new().fail_on("colorize", 3);

        runner
            .run(&Invocation::new("image_listing", "tool", vec![]))
            .await
            .unwrap();
        let err = runner
            .run(&Invocation::new("colorize", "tool", vec!["-i".into()]))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), Some(3));
        assert_eq!(runner.stage_names(), vec!["image_listing", "colorize"]);
    }

    #[tokio::test]
    async fn test_materializing_runner_writes_artifacts() {
        let tmp = tempfile::tempdir().unwrap();
        let artifact = tmp.path().join("nested/scene.mvs");
        let runner = RecordingCommandRunner::new().materializing();

        runner
            .run(&Invocation::new("export_to_mvs", "tool", vec![]).with_produces(vec![artifact.clone()]))
            .await
            .unwrap();

        assert_eq!(std::fs::read_to_string(artifact).unwrap(), "export_to_mvs\n");
    }

    #[tokio::test]
    async fn test_cancel_after_trips_token() {
        let token = Arc::new(CancellationToken::new());
        let runner = RecordingCommandRunner::new().cancel_after("pair_generation", token.clone());

        runner.run(&Invocation::new("compute_features", "t", vec![])).await.unwrap();
        assert!(!token.is_cancelled());
        runner.run(&Invocation::new("pair_generation", "t", vec![])).await.unwrap();
        assert_eq!(token.reason().as_deref(), Some("cancelled after pair_generation"));
    }

    #[tokio::test]
    async fn test_static_provider_counts_calls() {
        let tmp = tempfile::tempdir().unwrap();
        let provider = StaticResourceProvider::new("sensors.txt", "Canon;6.2");

        let path = provider.fetch("https://host/db.txt", tmp.path()).await.unwrap();

        assert_eq!(path, tmp.path().join("sensors.txt"));
        assert_eq!(std::fs::read_to_string(path).unwrap(), "Canon;6.2");
        assert_eq!(provider.call_count(), 1);
        assert_eq!(provider.urls(), vec!["https://host/db.txt"]);
    }
}
