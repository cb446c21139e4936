//! Subprocess-backed command runner.

use super::{CommandRunner, Invocation};
use crate::errors::{ExternalToolError, ToolFailure};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

/// Runs invocations as child processes.
///
/// The child's stdout and stderr are inherited, so tool output streams to
/// the operator live. There is no retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    /// Creates a new process runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation) -> Result<(), ExternalToolError> {
        let fail = |reason: ToolFailure| {
            ExternalToolError::new(
                &invocation.stage,
                invocation.program_display(),
                invocation.args.clone(),
                reason,
            )
        };

        info!(
            stage = %invocation.stage,
            tool = %invocation.program.display(),
            args = ?invocation.args,
            "running: {}",
            invocation
        );

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| fail(ToolFailure::Launch(e)))?;

        let status = match invocation.timeout {
            Some(limit) => {
                let waited = tokio::time::timeout(limit, child.wait()).await;
                match waited {
                    Ok(status) => status,
                    Err(_) => {
                        warn!(stage = %invocation.stage, seconds = limit.as_secs_f64(), "Tool timed out, killing it");
                        if let Err(e) = child.kill().await {
                            warn!(stage = %invocation.stage, error = %e, "Failed to kill timed out tool");
                        }
                        return Err(fail(ToolFailure::Timeout {
                            seconds: limit.as_secs_f64(),
                        }));
                    }
                }
            }
            None => child.wait().await,
        }
        .map_err(|e| fail(ToolFailure::Wait(e)))?;

        if status.success() {
            Ok(())
        } else {
            Err(fail(ToolFailure::Exit {
                code: status.code(),
            }))
        }
    }
}
