//! Orchestration of one conversion: validate, probe, gate, run, finalize.

use std::fmt;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use aac2alac_av::tools::{FFMPEG, FFPROBE};
use aac2alac_av::{
    policy, runner, ConversionOutcome, ConversionRequest, EngineCommand, Error, FfprobeProber,
    OverwritePolicy, Progress, Result, StreamKind, Summary, ToolRegistry, ToolsConfig, Verdict,
    Workspace,
};
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::console::Console;

/// Command-line inputs for `convert`, before config defaults are applied.
#[derive(Debug, Clone, Default)]
pub struct ConvertOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    pub progress: bool,
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
    pub no_overwrite: bool,
    pub threads: Option<u32>,
    pub mux_flags: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ConvertOptions {
    /// Layer these options over `config`. Command-line values win.
    pub fn into_request(self, config: &Config) -> ConversionRequest {
        let mut request = ConversionRequest::new(self.input, &self.output);

        request.tools = config.tools.merged_with(&ToolsConfig {
            ffmpeg_path: self.ffmpeg,
            ffprobe_path: self.ffprobe,
        });
        request.overwrite = if self.no_overwrite || !config.conversion.overwrite {
            OverwritePolicy::Forbid
        } else {
            OverwritePolicy::Allow
        };
        request.threads = self.threads.or(config.conversion.threads);
        request.mux_flags = self
            .mux_flags
            .or_else(|| config.conversion.mux_flags.clone());
        request.progress = self.progress;
        request.timeout = self
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| config.conversion.timeout());

        request
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Init,
    Probed,
    Validated,
    Built,
    Running,
    Finalizing,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Init => "init",
            Stage::Probed => "probed",
            Stage::Validated => "validated",
            Stage::Built => "built",
            Stage::Running => "running",
            Stage::Finalizing => "finalizing",
        };
        f.write_str(name)
    }
}

fn advance(stage: &mut Stage, next: Stage) {
    tracing::debug!("stage {stage} -> {next}");
    *stage = next;
}

/// Run one conversion to completion, writing protocol lines to `console`.
///
/// Never fails: every error is reported on the console and reflected in the
/// returned outcome's exit code.
pub async fn convert<O: Write, E: Write>(
    request: &ConversionRequest,
    cancel: &CancellationToken,
    console: &mut Console<O, E>,
) -> ConversionOutcome {
    let mut stage = Stage::Init;
    let mut summary = Summary::default();

    match execute(request, cancel, console, &mut stage, &mut summary).await {
        Ok(path) => {
            tracing::info!(
                "converted {} -> {}",
                request.input().display(),
                path.display()
            );
            console.ok(&path, &summary);
            if request.progress {
                console.done(&path);
            }
            ConversionOutcome::success(summary, path)
        }
        Err(e) => {
            tracing::debug!("conversion failed while {stage}: {e}");
            report(console, &e);
            ConversionOutcome::failure(e.exit_code(), summary)
        }
    }
}

async fn execute<O: Write, E: Write>(
    request: &ConversionRequest,
    cancel: &CancellationToken,
    console: &mut Console<O, E>,
    stage: &mut Stage,
    summary: &mut Summary,
) -> Result<PathBuf> {
    request.validate()?;

    let registry = ToolRegistry::discover(&request.tools);
    let ffprobe = registry.require(FFPROBE)?.path.clone();
    let ffmpeg = registry.require(FFMPEG)?.path.clone();

    let media = FfprobeProber::new(ffprobe)
        .probe(request.input(), cancel)
        .await
        .map_err(probe_failure)?;
    *summary = Summary {
        video: media.count(StreamKind::Video),
        audio: media.count(StreamKind::Audio),
    };
    advance(stage, Stage::Probed);

    if let Verdict::Reject(rejection) = policy::evaluate(&media) {
        tracing::info!("rejected {}: {rejection}", request.input().display());
        return Err(Error::Rejected(rejection));
    }
    advance(stage, Stage::Validated);

    let workspace = Workspace::new(request.output())?;
    let plan = EngineCommand::build(request, &media, &ffmpeg, &workspace.output());
    advance(stage, Stage::Built);

    advance(stage, Stage::Running);
    let result = if request.progress {
        let mut report = |p: Progress| {
            if let Some(pct) = p.percent {
                console.progress(pct);
            }
        };
        runner::run(&plan, cancel, Some(&mut report)).await?
    } else {
        runner::run(&plan, cancel, None).await?
    };
    result.check()?;

    advance(stage, Stage::Finalizing);
    workspace.finalize(request.overwrite)
}

/// A prober that ran but misbehaved (e.g. timed out) is a bad input, not an
/// engine failure.
fn probe_failure(e: Error) -> Error {
    match e {
        Error::Tool { message, .. } => Error::probe(message, String::new()),
        other => other,
    }
}

fn report<O: Write, E: Write>(console: &mut Console<O, E>, error: &Error) {
    match error {
        Error::Rejected(rejection) => console.not_aac(rejection),
        Error::EngineFailed { output, .. } => {
            console.engine_output(output);
            console.error(error);
        }
        Error::Probe { stderr, .. } => {
            match stderr.lines().rev().map(str::trim).find(|l| !l.is_empty()) {
                Some(detail) => console.error(format_args!("{error}: {detail}")),
                None => console.error(error),
            }
        }
        _ => console.error(error),
    }
}
