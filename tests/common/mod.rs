//! Shared test harness for integration tests.
//!
//! Provides [`FakeTools`], a temporary directory holding scripted stand-ins
//! for `ffprobe` and `ffmpeg`. Each script appends its name to a `calls` log
//! so tests can assert whether a subprocess was launched.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// ffprobe JSON for one H.264 video and one AAC audio stream.
pub const H264_AAC: &str = r#"{
    "streams": [
        {"index": 0, "codec_name": "h264", "codec_type": "video", "codec_tag_string": "avc1"},
        {"index": 1, "codec_name": "aac", "codec_type": "audio", "codec_tag_string": "mp4a"}
    ],
    "format": {"format_name": "mov,mp4,m4a,3gp,3g2,mj2", "duration": "10.000000"}
}"#;

/// ffprobe JSON for one AAC and one MP3 audio stream.
pub const AAC_AND_MP3: &str = r#"{
    "streams": [
        {"index": 0, "codec_name": "aac", "codec_type": "audio"},
        {"index": 1, "codec_name": "mp3", "codec_type": "audio"}
    ],
    "format": {"duration": "10.000000"}
}"#;

/// ffprobe JSON for a video-only file.
pub const VIDEO_ONLY: &str = r#"{
    "streams": [
        {"index": 0, "codec_name": "h264", "codec_type": "video"}
    ],
    "format": {"duration": "10.000000"}
}"#;

/// ffmpeg body that writes a small file to its last argument.
pub const ENGINE_OK: &str = "for last; do :; done\nprintf 'alac payload' > \"$last\"";

/// ffmpeg body that emits two progress blocks before writing its output.
pub const ENGINE_PROGRESS: &str = "case \" $* \" in *\" -progress \"*)\n\
    printf 'out_time_us=2500000\\nprogress=continue\\nout_time_us=10000000\\nprogress=end\\n'\n\
    ;; esac\n\
    for last; do :; done\nprintf 'alac payload' > \"$last\"";

/// ffmpeg body that leaves a partial file behind and fails.
pub const ENGINE_FAIL: &str = "for last; do :; done\nprintf 'partial' > \"$last\"\n\
    echo 'Error while decoding stream #0:1' >&2\nexit 1";

/// ffmpeg body that starts writing its output and then hangs.
pub const ENGINE_STALL: &str = "for last; do :; done\nprintf 'partial' > \"$last\"\nexec sleep 30";

pub struct FakeTools {
    pub dir: TempDir,
}

impl FakeTools {
    pub fn new(probe_json: &str, engine_body: &str) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let fake = Self { dir };
        fs::create_dir(fake.bin_dir()).unwrap();
        fake.script(
            "ffprobe",
            &format!("cat <<'JSON'\n{probe_json}\nJSON"),
        );
        fake.script("ffmpeg", engine_body);
        fake
    }

    fn script(&self, name: &str, body: &str) {
        let path = self.bin_dir().join(name);
        let calls = self.calls_file();
        let args = self.dir.path().join(format!("{name}.args"));
        fs::write(
            &path,
            format!(
                "#!/bin/sh\necho {name} >> '{}'\nprintf '%s\\n' \"$@\" > '{}'\n{body}\n",
                calls.display(),
                args.display()
            ),
        )
        .unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.dir.path().join("bin")
    }

    pub fn ffprobe(&self) -> PathBuf {
        self.bin_dir().join("ffprobe")
    }

    pub fn ffmpeg(&self) -> PathBuf {
        self.bin_dir().join("ffmpeg")
    }

    fn calls_file(&self) -> PathBuf {
        self.dir.path().join("calls")
    }

    /// Names of the tools invoked so far, in order.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.calls_file())
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Arguments of the most recent invocation of `tool`, one per entry.
    pub fn args_of(&self, tool: &str) -> Vec<String> {
        fs::read_to_string(self.dir.path().join(format!("{tool}.args")))
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Create an input file in a separate `media` directory.
    pub fn input(&self, name: &str) -> PathBuf {
        let media = self.media_dir();
        fs::create_dir_all(&media).unwrap();
        let path = media.join(name);
        fs::write(&path, b"stand-in media").unwrap();
        path
    }

    pub fn media_dir(&self) -> PathBuf {
        self.dir.path().join("media")
    }

    /// Sorted entry names in `dir`.
    pub fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}
