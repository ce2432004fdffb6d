//! Terminal results of a conversion and the exit-code table.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// Process exit codes understood by callers of the converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitCode {
    /// Conversion finished and the destination was written.
    Ok,
    /// Caller misuse: missing input, destination collision, bad flags.
    BadArgs,
    /// ffmpeg or ffprobe could not be found.
    ToolsMissing,
    /// Audio is absent or not AAC.
    RejectedNotAac,
    /// The engine failed, timed out or was cancelled.
    EngineFailed,
}

impl ExitCode {
    /// Numeric process exit code.
    pub fn code(self) -> u8 {
        match self {
            ExitCode::Ok => 0,
            ExitCode::BadArgs => 1,
            ExitCode::ToolsMissing => 2,
            ExitCode::RejectedNotAac => 3,
            ExitCode::EngineFailed => 4,
        }
    }
}

impl From<ExitCode> for std::process::ExitCode {
    fn from(code: ExitCode) -> Self {
        std::process::ExitCode::from(code.code())
    }
}

/// Stream counts reported for a conversion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub video: usize,
    pub audio: usize,
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "video: {}, audio: {}", self.video, self.audio)
    }
}

/// Final result of one conversion invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConversionOutcome {
    pub exit_code: ExitCode,
    pub summary: Summary,
    /// Destination path, present only when the conversion succeeded.
    pub output: Option<PathBuf>,
}

impl ConversionOutcome {
    pub fn success(summary: Summary, output: PathBuf) -> Self {
        Self {
            exit_code: ExitCode::Ok,
            summary,
            output: Some(output),
        }
    }

    pub fn failure(exit_code: ExitCode, summary: Summary) -> Self {
        Self {
            exit_code,
            summary,
            output: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == ExitCode::Ok
    }
}
