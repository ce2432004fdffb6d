//! Media file probing.
//!
//! [`FfprobeProber`] shells out to ffprobe and classifies every stream of
//! the input into a [`MediaDescriptor`].

pub mod ffprobe;
mod types;

pub use self::ffprobe::{parse_ffprobe_json, FfprobeProber};
pub use types::*;
