//! # aac2alac-av
//!
//! Probing, policy and ffmpeg orchestration for remuxing AAC audio into ALAC.
//!
//! This crate provides:
//!
//! - **Tool discovery** ([`ToolRegistry`]) -- locate ffmpeg and ffprobe from
//!   explicit overrides or `PATH`.
//! - **Command execution** ([`ToolCommand`]) -- async builder with timeout and
//!   cancellation, with captured or line-streamed output.
//! - **Stream inspection** ([`probe::FfprobeProber`]) -- classify the streams
//!   of an input container.
//! - **Policy** ([`policy::evaluate`]) -- accept only inputs whose audio is
//!   entirely AAC.
//! - **Planning and running** ([`EngineCommand`], [`runner::run`]) -- build the
//!   ffmpeg invocation and execute it, translating `-progress` output.
//! - **Workspace management** ([`Workspace`]) -- scratch directory lifecycle
//!   with atomic finalization.

pub mod command;
pub mod error;
pub mod outcome;
pub mod plan;
pub mod policy;
pub mod probe;
pub mod progress;
pub mod request;
pub mod runner;
pub mod tools;
pub mod workspace;

// ---- Re-exports for convenience ----

pub use command::{ToolCommand, ToolOutput};
pub use error::{Error, Result};
pub use outcome::{ConversionOutcome, ExitCode, Summary};
pub use plan::EngineCommand;
pub use policy::{evaluate, RejectReason, Rejection, Verdict};
pub use probe::{FfprobeProber, MediaDescriptor, StreamDescriptor, StreamKind};
pub use progress::{Progress, ProgressTracker};
pub use request::{ConversionRequest, OverwritePolicy};
pub use runner::{run, RunResult};
pub use tools::{ToolConfig, ToolInfo, ToolRegistry, ToolsConfig};
pub use workspace::Workspace;
