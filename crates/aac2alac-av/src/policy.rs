//! Accept/reject decision for a probed input.
//!
//! Only inputs whose audio is entirely AAC are converted. Anything else is
//! rejected with the offending codec names so the caller can report them.

use std::collections::BTreeSet;
use std::fmt;

use serde::Serialize;

use crate::probe::{MediaDescriptor, StreamKind};

/// The only audio codec accepted as a source.
pub const SOURCE_CODEC: &str = "aac";

/// Stand-in name for an audio stream whose codec ffprobe did not report.
pub const UNKNOWN_CODEC: &str = "unknown";

/// Why an input was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// The input has no audio streams at all.
    NoAudio,
    /// At least one audio stream is not AAC.
    UnsupportedCodecs,
}

/// A rejected input, with the distinct offending codecs sorted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rejection {
    pub reason: RejectReason,
    pub offending: Vec<String>,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.reason {
            RejectReason::NoAudio => f.write_str("no audio tracks"),
            RejectReason::UnsupportedCodecs => f.write_str(&self.offending.join(", ")),
        }
    }
}

/// Result of [`evaluate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Verdict {
    Accept,
    Reject(Rejection),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Decide whether `media` may be converted.
pub fn evaluate(media: &MediaDescriptor) -> Verdict {
    let mut audio = media.streams_of(StreamKind::Audio).peekable();
    if audio.peek().is_none() {
        return Verdict::Reject(Rejection {
            reason: RejectReason::NoAudio,
            offending: Vec::new(),
        });
    }

    let offending: BTreeSet<String> = audio
        .filter_map(|stream| match stream.codec_name.as_deref() {
            Some(codec) if codec.eq_ignore_ascii_case(SOURCE_CODEC) => None,
            Some(codec) => Some(codec.to_ascii_lowercase()),
            None => Some(UNKNOWN_CODEC.to_string()),
        })
        .collect();

    if offending.is_empty() {
        Verdict::Accept
    } else {
        Verdict::Reject(Rejection {
            reason: RejectReason::UnsupportedCodecs,
            offending: offending.into_iter().collect(),
        })
    }
}
