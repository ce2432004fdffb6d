//! FFprobe-based stream inspection.
//!
//! Shells out to `ffprobe -v error -print_format json -show_format -show_streams`
//! and maps the JSON output into a [`MediaDescriptor`].

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

use super::types::{MediaDescriptor, StreamDescriptor, StreamKind};
use crate::command::ToolCommand;
use crate::{Error, Result};

/// Probing reads headers only; a minute is generous.
const PROBE_TIMEOUT: Duration = Duration::from_secs(60);

/// A prober backed by the `ffprobe` CLI.
#[derive(Debug, Clone)]
pub struct FfprobeProber {
    /// Path to the ffprobe binary.
    ffprobe_path: PathBuf,
}

impl FfprobeProber {
    /// Create a new prober using the given ffprobe path.
    pub fn new(ffprobe_path: PathBuf) -> Self {
        Self { ffprobe_path }
    }

    /// Probe `input` and classify its streams.
    ///
    /// # Errors
    ///
    /// - [`Error::ToolNotFound`] if ffprobe cannot be spawned.
    /// - [`Error::Probe`] if ffprobe exits non-zero or prints JSON we cannot
    ///   parse. The raw stderr is kept on the error.
    pub async fn probe(&self, input: &Path, cancel: &CancellationToken) -> Result<MediaDescriptor> {
        let mut cmd = ToolCommand::new(self.ffprobe_path.clone());
        cmd.timeout(PROBE_TIMEOUT);
        cmd.args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_format",
            "-show_streams",
        ]);
        cmd.arg(input.to_string_lossy().as_ref());

        let output = cmd.output(cancel).await?;

        if !output.status.success() {
            return Err(Error::probe(
                format!("ffprobe exited with {}", output.status),
                output.stderr,
            ));
        }

        parse_ffprobe_json(&output.stdout).map_err(|e| match e {
            Error::Json(e) => Error::probe(format!("ffprobe JSON parse error: {e}"), output.stderr),
            other => other,
        })
    }
}

// ---------------------------------------------------------------------------
// JSON structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    format: Option<FfprobeFormat>,
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    format_name: Option<String>,
    duration: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    index: Option<u32>,
    codec_type: Option<String>,
    codec_name: Option<String>,
    codec_tag_string: Option<String>,
}

// ---------------------------------------------------------------------------
// Parsing helpers
// ---------------------------------------------------------------------------

/// Parse the JSON document printed by ffprobe.
pub fn parse_ffprobe_json(json: &str) -> Result<MediaDescriptor> {
    let output: FfprobeOutput = serde_json::from_str(json)?;
    Ok(parse_ffprobe_output(output))
}

fn parse_ffprobe_output(output: FfprobeOutput) -> MediaDescriptor {
    let (format_name, duration_secs) = match output.format {
        Some(format) => (
            format.format_name,
            format.duration.as_deref().map(parse_duration).unwrap_or(0.0),
        ),
        None => (None, 0.0),
    };

    let streams = output
        .streams
        .into_iter()
        .enumerate()
        .map(|(position, stream)| StreamDescriptor {
            index: stream.index.unwrap_or(position as u32),
            kind: classify(
                stream.codec_type.as_deref(),
                stream.codec_tag_string.as_deref(),
            ),
            codec_name: stream.codec_name.filter(|name| !name.is_empty()),
        })
        .collect();

    MediaDescriptor {
        streams,
        duration_secs,
        format_name,
    }
}

fn classify(codec_type: Option<&str>, codec_tag: Option<&str>) -> StreamKind {
    match codec_type.unwrap_or("") {
        "video" => StreamKind::Video,
        "audio" => StreamKind::Audio,
        "subtitle" => StreamKind::Subtitle,
        "attachment" => StreamKind::Attachment,
        _ if codec_tag == Some("tmcd") => StreamKind::Timecode,
        _ => StreamKind::Data,
    }
}

/// `"N/A"`, negative and non-finite durations all mean "unknown".
fn parse_duration(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs > 0.0 => secs,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOV_WITH_TIMECODE: &str = r#"{
        "streams": [
            {"index": 0, "codec_name": "h264", "codec_type": "video", "codec_tag_string": "avc1"},
            {"index": 1, "codec_name": "aac", "codec_type": "audio", "codec_tag_string": "mp4a"},
            {"index": 2, "codec_type": "data", "codec_tag_string": "tmcd"},
            {"index": 3, "codec_name": "mov_text", "codec_type": "subtitle"}
        ],
        "format": {
            "filename": "clip.mov",
            "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
            "duration": "62.041000"
        }
    }"#;

    #[test]
    fn parses_streams_and_duration() {
        let media = parse_ffprobe_json(MOV_WITH_TIMECODE).unwrap();
        assert_eq!(media.streams.len(), 4);
        assert_eq!(media.streams[0].kind, StreamKind::Video);
        assert_eq!(media.streams[1].codec_name.as_deref(), Some("aac"));
        assert_eq!(media.streams[2].kind, StreamKind::Timecode);
        assert_eq!(media.streams[3].kind, StreamKind::Subtitle);
        assert!((media.duration_secs - 62.041).abs() < 1e-9);
        assert_eq!(media.format_name.as_deref(), Some("mov,mp4,m4a,3gp,3g2,mj2"));
    }

    #[test]
    fn missing_codec_is_not_guessed() {
        let media = parse_ffprobe_json(MOV_WITH_TIMECODE).unwrap();
        assert_eq!(media.streams[2].codec_name, None);
    }

    #[test]
    fn classification() {
        assert_eq!(classify(Some("data"), Some("tmcd")), StreamKind::Timecode);
        assert_eq!(classify(Some("data"), Some("rtp ")), StreamKind::Data);
        assert_eq!(classify(Some("attachment"), None), StreamKind::Attachment);
        assert_eq!(classify(None, None), StreamKind::Data);
    }

    #[test]
    fn unknown_duration_is_zero() {
        assert_eq!(parse_duration("N/A"), 0.0);
        assert_eq!(parse_duration("-1.0"), 0.0);
        assert_eq!(parse_duration("10.5"), 10.5);

        let media = parse_ffprobe_json(r#"{"streams": []}"#).unwrap();
        assert_eq!(media.duration_secs, 0.0);
        assert!(media.streams.is_empty());
    }

    #[test]
    fn garbage_is_an_error() {
        assert!(matches!(
            parse_ffprobe_json("moov atom not found"),
            Err(Error::Json(_))
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_prober_keeps_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("ffprobe");
        std::fs::write(&script, "#!/bin/sh\necho 'Invalid data found when processing input' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let err = FfprobeProber::new(script)
            .probe(Path::new("broken.mp4"), &CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            Error::Probe { stderr, .. } => assert!(stderr.contains("Invalid data")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
