//! ffmpeg invocation for an AAC to ALAC remux.
//!
//! Each stream class is mapped on its own with an optional (`?`) specifier,
//! so inputs without, say, subtitles still convert. Audio is re-encoded to
//! ALAC and everything else is copied.

use std::path::{Path, PathBuf};

use crate::command::ToolCommand;
use crate::probe::{MediaDescriptor, StreamKind};
use crate::request::ConversionRequest;

/// Codec every audio stream is re-encoded to.
pub const TARGET_CODEC: &str = "alac";

/// `-movflags` value used unless the caller overrides it.
pub const DEFAULT_MUX_FLAGS: &str = "+faststart";

/// ffmpeg stream specifier and output codec per stream class, in map order.
/// Timecode tracks are data streams to ffmpeg and ride on the `d` mapping.
const STREAM_MAPPINGS: &[(&str, &str)] = &[
    ("v", "copy"),
    ("a", TARGET_CODEC),
    ("s", "copy"),
    ("d", "copy"),
    ("t", "copy"),
];

/// A fully built engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineCommand {
    command: ToolCommand,
    output: PathBuf,
    duration_secs: Option<f64>,
}

impl EngineCommand {
    /// Build the ffmpeg command writing to `scratch_output`.
    ///
    /// `media` provides the duration used for progress percentages; the
    /// stream mapping itself does not depend on which classes are present.
    pub fn build(
        request: &ConversionRequest,
        media: &MediaDescriptor,
        ffmpeg: &Path,
        scratch_output: &Path,
    ) -> Self {
        let mut cmd = ToolCommand::new(ffmpeg.to_path_buf());
        cmd.timeout(request.timeout);

        // -y only ever applies to the private scratch file.
        cmd.args(["-hide_banner", "-nostdin", "-y", "-i"]);
        cmd.arg(request.input().to_string_lossy().as_ref());

        for (class, _) in STREAM_MAPPINGS {
            cmd.args(["-map".to_string(), format!("0:{class}?")]);
        }
        for (class, codec) in STREAM_MAPPINGS {
            cmd.args([format!("-c:{class}"), codec.to_string()]);
        }

        if let Some(threads) = request.threads {
            cmd.args(["-threads".to_string(), threads.to_string()]);
        }

        let mux_flags = request
            .mux_flags
            .as_deref()
            .map(str::trim)
            .unwrap_or(DEFAULT_MUX_FLAGS);
        if !mux_flags.is_empty() {
            cmd.args(["-movflags", mux_flags]);
        }

        if request.progress {
            cmd.args(["-progress", "pipe:1", "-nostats"]);
        }

        cmd.arg(scratch_output.to_string_lossy().as_ref());

        tracing::debug!(
            "engine plan: video={} audio={} subtitle={} data={} timecode={} attachment={}",
            media.count(StreamKind::Video),
            media.count(StreamKind::Audio),
            media.count(StreamKind::Subtitle),
            media.count(StreamKind::Data),
            media.count(StreamKind::Timecode),
            media.count(StreamKind::Attachment),
        );

        Self {
            command: cmd,
            output: scratch_output.to_path_buf(),
            duration_secs: media.duration(),
        }
    }

    pub fn command(&self) -> &ToolCommand {
        &self.command
    }

    /// Where the engine writes; always inside the scratch workspace.
    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Probed duration, if known.
    pub fn duration(&self) -> Option<f64> {
        self.duration_secs
    }
}
