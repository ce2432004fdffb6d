//! Stream classification types produced by probing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Class of an elementary stream inside a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamKind {
    Video,
    Audio,
    Subtitle,
    /// Generic data tracks.
    Data,
    /// QuickTime `tmcd` tracks. ffprobe reports these as data.
    Timecode,
    /// Container attachments such as fonts.
    Attachment,
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamKind::Video => "video",
            StreamKind::Audio => "audio",
            StreamKind::Subtitle => "subtitle",
            StreamKind::Data => "data",
            StreamKind::Timecode => "timecode",
            StreamKind::Attachment => "attachment",
        };
        f.write_str(name)
    }
}

/// One stream as reported by the prober.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamDescriptor {
    /// Absolute stream index in the container.
    pub index: u32,
    pub kind: StreamKind,
    /// Codec name as reported, if the prober knew it.
    pub codec_name: Option<String>,
}

/// Streams and duration of one input file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    pub streams: Vec<StreamDescriptor>,
    /// Container duration in seconds; `0.0` when unknown.
    pub duration_secs: f64,
    /// Container format name (e.g. "mov,mp4,m4a,3gp,3g2,mj2").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format_name: Option<String>,
}

impl MediaDescriptor {
    /// Streams of one kind, in container order.
    pub fn streams_of(&self, kind: StreamKind) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.iter().filter(move |s| s.kind == kind)
    }

    pub fn count(&self, kind: StreamKind) -> usize {
        self.streams_of(kind).count()
    }

    /// Duration if it is known and usable for progress math.
    pub fn duration(&self) -> Option<f64> {
        (self.duration_secs.is_finite() && self.duration_secs > 0.0).then_some(self.duration_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(index: u32, kind: StreamKind, codec: Option<&str>) -> StreamDescriptor {
        StreamDescriptor {
            index,
            kind,
            codec_name: codec.map(str::to_string),
        }
    }

    #[test]
    fn counts_by_kind() {
        let media = MediaDescriptor {
            streams: vec![
                stream(0, StreamKind::Video, Some("h264")),
                stream(1, StreamKind::Audio, Some("aac")),
                stream(2, StreamKind::Audio, None),
                stream(3, StreamKind::Timecode, None),
            ],
            duration_secs: 12.5,
            format_name: None,
        };
        assert_eq!(media.count(StreamKind::Video), 1);
        assert_eq!(media.count(StreamKind::Audio), 2);
        assert_eq!(media.count(StreamKind::Subtitle), 0);
        assert_eq!(media.count(StreamKind::Timecode), 1);
        assert_eq!(media.duration(), Some(12.5));
    }

    #[test]
    fn unknown_duration() {
        let mut media = MediaDescriptor::default();
        assert_eq!(media.duration(), None);
        media.duration_secs = f64::NAN;
        assert_eq!(media.duration(), None);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&StreamKind::Timecode).unwrap();
        assert_eq!(json, "\"timecode\"");
        assert_eq!(StreamKind::Subtitle.to_string(), "subtitle");
    }
}
