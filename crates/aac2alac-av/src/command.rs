//! Builder for executing external tool commands with timeout and
//! cancellation support.

use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio_util::sync::CancellationToken;

use crate::{Error, Result};

/// Default command timeout: 5 minutes.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Output captured from a tool execution.
#[derive(Debug, Clone)]
pub struct ToolOutput {
    /// Process exit status.
    pub status: ExitStatus,
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

impl ToolOutput {
    /// Standard output followed by standard error.
    pub fn combined(&self) -> String {
        let mut text = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        text.push_str(&self.stdout);
        if !self.stdout.is_empty() && !self.stdout.ends_with('\n') && !self.stderr.is_empty() {
            text.push('\n');
        }
        text.push_str(&self.stderr);
        text
    }
}

/// A builder for constructing and executing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use aac2alac_av::ToolCommand;
/// use std::path::PathBuf;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> aac2alac_av::Result<()> {
/// let output = ToolCommand::new(PathBuf::from("ffprobe"))
///     .args(["-v", "error", "-print_format", "json", "-show_streams"])
///     .arg("/path/to/clip.mp4")
///     .output(&CancellationToken::new())
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<String>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: PathBuf) -> Self {
        Self {
            program,
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl Into<String>) -> &mut Self {
        self.args.push(s.into());
        self
    }

    /// Append multiple arguments.
    pub fn args(&mut self, iter: impl IntoIterator<Item = impl Into<String>>) -> &mut Self {
        self.args.extend(iter.into_iter().map(Into::into));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    fn spawn(&self) -> Result<Child> {
        tracing::debug!("spawn: {} {}", self.program.display(), self.args.join(" "));

        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound | std::io::ErrorKind::PermissionDenied => {
                    Error::tool_not_found(self.program_name())
                }
                _ => Error::tool(self.program_name(), format!("failed to spawn: {e}")),
            })
    }

    /// Run the command to completion, capturing stdout and stderr.
    ///
    /// A non-zero exit status is *not* an error here; callers classify the
    /// returned [`ToolOutput`] themselves.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if the program cannot be spawned.
    /// - [`Error::Tool`] on timeout or I/O failure while waiting.
    /// - [`Error::Cancelled`] if `cancel` fires first. The child is killed.
    pub async fn output(&self, cancel: &CancellationToken) -> Result<ToolOutput> {
        let name = self.program_name();
        let child = self.spawn()?;

        // Dropping the wait future drops the child, and kill_on_drop reaps it.
        tokio::select! {
            result = tokio::time::timeout(self.timeout, child.wait_with_output()) => match result {
                Ok(Ok(output)) => Ok(ToolOutput {
                    status: output.status,
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                }),
                Ok(Err(e)) => Err(Error::tool(name, format!("I/O error waiting for process: {e}"))),
                Err(_elapsed) => Err(Error::tool(name, format!("timed out after {:?}", self.timeout))),
            },
            _ = cancel.cancelled() => {
                tracing::info!("{name} cancelled");
                Err(Error::Cancelled)
            }
        }
    }

    /// Run the command, handing each stdout line to `on_line` as it arrives.
    ///
    /// Stderr is drained concurrently so that neither pipe can fill up and
    /// stall the child. The returned [`ToolOutput`] has an empty `stdout`
    /// (it was consumed by `on_line`) and the full `stderr`.
    pub async fn stream<F>(&self, cancel: &CancellationToken, mut on_line: F) -> Result<ToolOutput>
    where
        F: FnMut(&str),
    {
        let name = self.program_name();
        let mut child = self.spawn()?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::tool(&name, "stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::tool(&name, "stderr was not captured"))?;
        let stderr_task = tokio::spawn(drain(stderr));

        let mut lines = BufReader::new(stdout).lines();
        let deadline = tokio::time::sleep(self.timeout);
        tokio::pin!(deadline);

        loop {
            let interrupt = tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        on_line(&line);
                        continue;
                    }
                    Ok(None) => break,
                    Err(e) => Interrupt::Failed(format!("failed to read output: {e}")),
                },
                _ = cancel.cancelled() => Interrupt::Cancelled,
                _ = &mut deadline => Interrupt::TimedOut,
            };
            kill(&mut child, &name).await;
            return Err(interrupt.into_error(name, self.timeout));
        }

        // Stdout closed; the child may still be flushing its output file.
        let waited = tokio::select! {
            status = child.wait() => Ok(status),
            _ = cancel.cancelled() => Err(Interrupt::Cancelled),
            _ = &mut deadline => Err(Interrupt::TimedOut),
        };
        let status = match waited {
            Ok(status) => status
                .map_err(|e| Error::tool(&name, format!("I/O error waiting for process: {e}")))?,
            Err(interrupt) => {
                kill(&mut child, &name).await;
                return Err(interrupt.into_error(name, self.timeout));
            }
        };

        let stderr = stderr_task
            .await
            .map_err(|e| Error::tool(&name, format!("stderr reader failed: {e}")))?
            .map_err(|e| Error::tool(&name, format!("failed to read stderr: {e}")))?;

        Ok(ToolOutput {
            status,
            stdout: String::new(),
            stderr,
        })
    }
}

/// Why a streaming run stopped before the child exited on its own.
enum Interrupt {
    Cancelled,
    TimedOut,
    Failed(String),
}

impl Interrupt {
    fn into_error(self, tool: String, timeout: Duration) -> Error {
        match self {
            Interrupt::Cancelled => {
                tracing::info!("{tool} cancelled");
                Error::Cancelled
            }
            Interrupt::TimedOut => Error::tool(tool, format!("timed out after {timeout:?}")),
            Interrupt::Failed(message) => Error::tool(tool, message),
        }
    }
}

async fn drain<R: AsyncRead + Unpin>(mut reader: R) -> std::io::Result<String> {
    let mut buf = Vec::new();
    reader.read_to_end(&mut buf).await?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

async fn kill(child: &mut Child, name: &str) {
    if let Err(e) = child.kill().await {
        tracing::warn!("failed to kill {name}: {e}");
    }
}
