use std::time::Duration;

use aac2alac_av::request::DEFAULT_ENGINE_TIMEOUT;
use aac2alac_av::ToolsConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub conversion: ConversionConfig,
}

/// Defaults for `convert`; every field can be overridden on the command line.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConversionConfig {
    /// Replace an existing output file.
    #[serde(default = "default_overwrite")]
    pub overwrite: bool,

    /// ffmpeg thread count (ffmpeg decides when unset).
    #[serde(default)]
    pub threads: Option<u32>,

    /// Replacement for the default `-movflags +faststart`.
    #[serde(default)]
    pub mux_flags: Option<String>,

    /// Limit for one ffmpeg run, in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_overwrite() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_ENGINE_TIMEOUT.as_secs()
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            overwrite: default_overwrite(),
            threads: None,
            mux_flags: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ConversionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
