//! The validated description of one conversion.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::tools::ToolsConfig;
use crate::{Error, Result};

/// Extension every output carries.
pub const CONTAINER_EXTENSION: &str = "mov";

/// Default limit for one ffmpeg run: 24 hours.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(86_400);

/// Whether an existing destination may be replaced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwritePolicy {
    #[default]
    Allow,
    Forbid,
}

/// Everything needed to convert one input.
///
/// The output path always carries the `.mov` extension; see
/// [`normalize_output_path`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionRequest {
    input: PathBuf,
    output: PathBuf,
    pub tools: ToolsConfig,
    pub overwrite: OverwritePolicy,
    pub threads: Option<u32>,
    /// Replacement for the default `-movflags` value. Empty disables them.
    pub mux_flags: Option<String>,
    pub progress: bool,
    pub timeout: Duration,
}

impl ConversionRequest {
    pub fn new(input: impl Into<PathBuf>, output: impl AsRef<Path>) -> Self {
        Self {
            input: input.into(),
            output: normalize_output_path(output.as_ref()),
            tools: ToolsConfig::default(),
            overwrite: OverwritePolicy::default(),
            threads: None,
            mux_flags: None,
            progress: false,
            timeout: DEFAULT_ENGINE_TIMEOUT,
        }
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    /// The normalized destination path.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Check the request before any subprocess is launched.
    ///
    /// # Errors
    ///
    /// - [`Error::InputNotFound`] if the input is missing or not a file.
    /// - [`Error::InvalidArgument`] for a zero thread count or timeout, or an
    ///   output that names a directory.
    /// - [`Error::DestinationExists`] if the output exists and overwriting is
    ///   forbidden.
    pub fn validate(&self) -> Result<()> {
        if !self.input.is_file() {
            return Err(Error::InputNotFound {
                path: self.input.clone(),
            });
        }

        if self.threads == Some(0) {
            return Err(Error::InvalidArgument("thread count must be at least 1".into()));
        }

        if self.timeout.is_zero() {
            return Err(Error::InvalidArgument("timeout must be greater than zero".into()));
        }

        if self.output.is_dir() {
            return Err(Error::InvalidArgument(format!(
                "output is a directory: {}",
                self.output.display()
            )));
        }

        if self.overwrite == OverwritePolicy::Forbid && self.output.exists() {
            return Err(Error::DestinationExists {
                path: self.output.clone(),
            });
        }

        Ok(())
    }
}

/// Append `.mov` unless the path already ends in it (any case).
///
/// `clip.MOV` is kept, `clip` becomes `clip.mov` and `clip.mp4` becomes
/// `clip.mp4.mov`, so a sibling of another format is never replaced.
pub fn normalize_output_path(path: &Path) -> PathBuf {
    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(CONTAINER_EXTENSION));

    if has_extension {
        return path.to_path_buf();
    }

    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(".");
    raw.push(CONTAINER_EXTENSION);
    PathBuf::from(raw)
}
