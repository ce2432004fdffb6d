//! Error types for aac2alac-av.

use std::path::PathBuf;
use std::process::ExitStatus;

use crate::outcome::ExitCode;
use crate::policy::Rejection;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while converting a file.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The caller supplied an argument that cannot be used.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The input file does not exist or is not a regular file.
    #[error("input not found: {}", path.display())]
    InputNotFound { path: PathBuf },

    /// The destination exists and overwriting is forbidden.
    #[error("destination already exists: {}", path.display())]
    DestinationExists { path: PathBuf },

    /// A required external tool is not available.
    #[error("tool not found: {tool}")]
    ToolNotFound { tool: String },

    /// An external tool could not be run to completion.
    #[error("tool error [{tool}]: {message}")]
    Tool { tool: String, message: String },

    /// The prober failed or produced output we could not understand.
    #[error("probe failed: {message}")]
    Probe { message: String, stderr: String },

    /// The input does not satisfy the AAC-only precondition.
    #[error("rejected: {0}")]
    Rejected(Rejection),

    /// The transcoding engine exited unsuccessfully.
    #[error("ffmpeg exited with {status}")]
    EngineFailed { status: ExitStatus, output: String },

    /// The conversion was cancelled before it completed.
    #[error("conversion cancelled")]
    Cancelled,

    /// Scratch workspace or finalization error.
    #[error("workspace error: {0}")]
    Workspace(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a tool not found error.
    pub fn tool_not_found(tool: impl Into<String>) -> Self {
        Self::ToolNotFound { tool: tool.into() }
    }

    /// Create a tool execution error.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Create a probe error, keeping the prober's raw stderr.
    pub fn probe(message: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::Probe {
            message: message.into(),
            stderr: stderr.into(),
        }
    }

    /// Create a workspace error.
    pub fn workspace(message: impl Into<String>) -> Self {
        Self::Workspace(message.into())
    }

    /// Map this error onto the process exit-code table.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Error::InvalidArgument(_)
            | Error::InputNotFound { .. }
            | Error::DestinationExists { .. }
            | Error::Probe { .. }
            | Error::Json(_) => ExitCode::BadArgs,
            Error::ToolNotFound { .. } => ExitCode::ToolsMissing,
            Error::Rejected(_) => ExitCode::RejectedNotAac,
            Error::Tool { .. }
            | Error::EngineFailed { .. }
            | Error::Cancelled
            | Error::Workspace(_)
            | Error::Io(_) => ExitCode::EngineFailed,
        }
    }
}
