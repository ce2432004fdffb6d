//! Execution of a planned engine command.

use std::process::ExitStatus;

use tokio_util::sync::CancellationToken;

use crate::command::ToolOutput;
use crate::plan::EngineCommand;
use crate::progress::{Progress, ProgressTracker};
use crate::{Error, Result};

/// What the engine did, before success is decided.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub status: ExitStatus,
    /// Everything the engine printed that was not progress telemetry.
    pub output: String,
}

impl RunResult {
    /// Turn a non-zero exit into [`Error::EngineFailed`].
    pub fn check(self) -> Result<RunResult> {
        if self.status.success() {
            Ok(self)
        } else {
            Err(Error::EngineFailed {
                status: self.status,
                output: self.output,
            })
        }
    }
}

/// Run `plan` to completion.
///
/// With `on_progress`, ffmpeg's `-progress` stream is parsed as it arrives
/// and every completed block is reported. Without it the engine runs silently
/// and its full output is captured.
///
/// The exit status is returned as-is; call [`RunResult::check`] to classify it.
///
/// # Errors
///
/// Spawn failures, timeouts and cancellation, as for
/// [`ToolCommand::output`](crate::ToolCommand::output).
pub async fn run(
    plan: &EngineCommand,
    cancel: &CancellationToken,
    on_progress: Option<&mut dyn FnMut(Progress)>,
) -> Result<RunResult> {
    let output: ToolOutput = match on_progress {
        Some(report) => {
            let mut tracker = ProgressTracker::new(plan.duration());
            plan.command()
                .stream(cancel, |line| {
                    if let Some(progress) = tracker.feed(line) {
                        report(progress);
                    }
                })
                .await?
        }
        None => {
            let out = plan.command().output(cancel).await?;
            ToolOutput {
                stdout: String::new(),
                stderr: out.combined(),
                status: out.status,
            }
        }
    };

    tracing::debug!("engine exited with {}", output.status);

    Ok(RunResult {
        status: output.status,
        output: output.stderr,
    })
}
