use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "aac2alac")]
#[command(author, version, about = "Remux AAC audio to ALAC, keeping every other track")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert a file with AAC audio into a .mov with ALAC audio
    Convert(ConvertArgs),

    /// Probe a media file and show whether it can be converted
    Probe {
        /// File to probe
        #[arg(required = true)]
        file: PathBuf,

        /// Output as JSON
        #[arg(long)]
        json: bool,

        /// Path to ffprobe (default: search PATH)
        #[arg(long, value_name = "PATH")]
        ffprobe: Option<PathBuf>,
    },

    /// Check that required external tools are available
    CheckTools,
}

#[derive(Args)]
pub struct ConvertArgs {
    /// Input file; every audio track must be AAC
    pub input: PathBuf,

    /// Output file; `.mov` is appended when missing
    pub output: PathBuf,

    /// Emit `PROGRESS <pct>` lines and a final `DONE <path>` on stdout
    #[arg(long)]
    pub progress: bool,

    /// Path to ffmpeg (default: search PATH)
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Path to ffprobe (default: search PATH)
    #[arg(long, value_name = "PATH")]
    pub ffprobe: Option<PathBuf>,

    /// Fail instead of replacing an existing output
    #[arg(long)]
    pub no_overwrite: bool,

    /// Number of ffmpeg threads
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub threads: Option<u32>,

    /// Value for -movflags (default: +faststart; empty disables)
    #[arg(long, value_name = "FLAGS")]
    pub mux_flags: Option<String>,

    /// Abort ffmpeg after this many seconds (default: 86400)
    #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}
