mod cli;

use aac2alac::config;
use aac2alac::console::Console;
use aac2alac::convert::{self, ConvertOptions};

use aac2alac_av::tools::FFPROBE;
use aac2alac_av::{policy, ExitCode, FfprobeProber, ToolRegistry, ToolsConfig, Verdict};
use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, ConvertArgs};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

fn main() -> std::process::ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version are not failures; everything else is misuse.
            let code = if e.use_stderr() {
                ExitCode::BadArgs
            } else {
                ExitCode::Ok
            };
            return code.into();
        }
    };

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag.
    // Logs go to stderr: stdout is reserved for protocol lines.
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "aac2alac=debug,aac2alac_av=debug".to_string()
        } else {
            "aac2alac=warn,aac2alac_av=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("error: failed to start async runtime: {e}");
            return ExitCode::EngineFailed.into();
        }
    };

    let code = match cli.command {
        Commands::Convert(args) => run_convert(&rt, args, cli.config.as_deref()),
        Commands::Probe {
            file,
            json,
            ffprobe,
        } => rt
            .block_on(probe_file(&file, json, ffprobe, cli.config.as_deref()))
            .unwrap_or_else(report_error),
        Commands::CheckTools => check_tools(cli.config.as_deref()).unwrap_or_else(report_error),
    };

    code.into()
}

fn report_error(e: anyhow::Error) -> ExitCode {
    eprintln!("error: {e:#}");
    e.downcast_ref::<aac2alac_av::Error>()
        .map(aac2alac_av::Error::exit_code)
        .unwrap_or(ExitCode::BadArgs)
}

fn run_convert(
    rt: &tokio::runtime::Runtime,
    args: ConvertArgs,
    config_path: Option<&Path>,
) -> ExitCode {
    let config = match config::load_config_or_default(config_path) {
        Ok(config) => config,
        Err(e) => return report_error(e),
    };

    let request = ConvertOptions {
        input: args.input,
        output: args.output,
        progress: args.progress,
        ffmpeg: args.ffmpeg,
        ffprobe: args.ffprobe,
        no_overwrite: args.no_overwrite,
        threads: args.threads,
        mux_flags: args.mux_flags,
        timeout_secs: args.timeout,
    }
    .into_request(&config);

    let cancel = CancellationToken::new();
    cancel_on_signal(rt, &cancel);

    let outcome = rt.block_on(async {
        let mut console = Console::stdio();
        convert::convert(&request, &cancel, &mut console).await
    });

    tracing::debug!("outcome: {:?}", outcome);
    outcome.exit_code
}

/// Cancel `cancel` when the process is asked to stop.
///
/// Handlers are installed before this returns, so a signal that arrives
/// while the engine runs always goes through the cancellation path.
#[cfg(unix)]
fn cancel_on_signal(rt: &tokio::runtime::Runtime, cancel: &CancellationToken) {
    use tokio::signal::unix::{signal, SignalKind};

    let _guard = rt.enter();
    for (name, kind) in [
        ("SIGINT", SignalKind::interrupt()),
        ("SIGTERM", SignalKind::terminate()),
        ("SIGHUP", SignalKind::hangup()),
    ] {
        let mut stream = match signal(kind) {
            Ok(stream) => stream,
            Err(e) => {
                tracing::warn!("failed to install {name} handler: {e}");
                continue;
            }
        };
        let cancel = cancel.clone();
        rt.spawn(async move {
            if stream.recv().await.is_some() {
                tracing::warn!("received {name}, stopping conversion");
                cancel.cancel();
            }
        });
    }
}

#[cfg(not(unix))]
fn cancel_on_signal(rt: &tokio::runtime::Runtime, cancel: &CancellationToken) {
    let cancel = cancel.clone();
    rt.spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted, stopping conversion");
            cancel.cancel();
        }
    });
}

async fn probe_file(
    file: &Path,
    json: bool,
    ffprobe: Option<PathBuf>,
    config_path: Option<&Path>,
) -> Result<ExitCode> {
    if !file.is_file() {
        anyhow::bail!("File does not exist: {:?}", file);
    }

    let config = config::load_config_or_default(config_path)?;
    let tools = config.tools.merged_with(&ToolsConfig {
        ffmpeg_path: None,
        ffprobe_path: ffprobe,
    });
    let registry = ToolRegistry::discover(&tools);
    let prober = FfprobeProber::new(registry.require(FFPROBE)?.path.clone());

    let media = prober
        .probe(file, &CancellationToken::new())
        .await
        .with_context(|| format!("Failed to probe {:?}", file))?;
    let verdict = policy::evaluate(&media);

    if json {
        let doc = serde_json::json!({
            "file": file,
            "media": media,
            "verdict": verdict,
        });
        println!("{}", serde_json::to_string_pretty(&doc)?);
    } else {
        println!("File: {}", file.display());
        if let Some(ref format) = media.format_name {
            println!("Container: {}", format);
        }
        if let Some(duration) = media.duration() {
            let secs = duration as u64;
            println!(
                "Duration: {:02}:{:02}:{:02}",
                secs / 3600,
                (secs / 60) % 60,
                secs % 60
            );
        }

        println!("\nStreams: {}", media.streams.len());
        for stream in &media.streams {
            println!(
                "  [{}] {} {}",
                stream.index,
                stream.kind,
                stream.codec_name.as_deref().unwrap_or("(unknown codec)")
            );
        }

        println!();
        match verdict {
            Verdict::Accept => println!("✓ Convertible: all audio is AAC"),
            Verdict::Reject(ref rejection) => println!("✗ NOT_AAC: {}", rejection),
        }
    }

    Ok(match verdict {
        Verdict::Accept => ExitCode::Ok,
        Verdict::Reject(_) => ExitCode::RejectedNotAac,
    })
}

fn check_tools(config_path: Option<&Path>) -> Result<ExitCode> {
    println!("Checking external tools...\n");

    let config = config::load_config_or_default(config_path)?;
    let tools = ToolRegistry::discover(&config.tools).check_all();
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
        Ok(ExitCode::Ok)
    } else {
        println!("Some tools are missing. Install ffmpeg to enable conversion.");
        Ok(ExitCode::ToolsMissing)
    }
}
