//! External tool detection and management.
//!
//! The [`ToolRegistry`] resolves the locations of `ffmpeg` and `ffprobe`,
//! preferring explicit overrides and falling back to a `PATH` lookup.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// The transcoding engine.
pub const FFMPEG: &str = "ffmpeg";
/// The stream prober.
pub const FFPROBE: &str = "ffprobe";

/// Known tool names that the registry manages.
const KNOWN_TOOLS: &[&str] = &[FFMPEG, FFPROBE];

/// Optional path overrides for the external tools.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Explicit path to ffmpeg.
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
    /// Explicit path to ffprobe.
    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}

impl ToolsConfig {
    fn override_for(&self, name: &str) -> Option<&Path> {
        match name {
            FFMPEG => self.ffmpeg_path.as_deref(),
            FFPROBE => self.ffprobe_path.as_deref(),
            _ => None,
        }
    }

    /// Layer `other` on top of `self`: overrides set in `other` win.
    pub fn merged_with(&self, other: &ToolsConfig) -> ToolsConfig {
        ToolsConfig {
            ffmpeg_path: other.ffmpeg_path.clone().or_else(|| self.ffmpeg_path.clone()),
            ffprobe_path: other
                .ffprobe_path
                .clone()
                .or_else(|| self.ffprobe_path.clone()),
        }
    }
}

/// A resolved tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolConfig {
    /// Tool name (e.g. "ffmpeg").
    pub name: String,
    /// Resolved path to the executable.
    pub path: PathBuf,
}

/// Availability information for a tool, returned by [`ToolRegistry::check_all`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    /// Tool name.
    pub name: String,
    /// Whether the tool was found.
    pub available: bool,
    /// Version string (first line of `-version` output), if available.
    pub version: Option<String>,
    /// Resolved path to the executable.
    pub path: Option<PathBuf>,
}

/// Registry holding discovered tool configurations.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: HashMap<String, ToolConfig>,
}

impl ToolRegistry {
    /// Discover tools using overrides from `config`, or `PATH`.
    ///
    /// An override is used only if it exists; otherwise [`which::which`]
    /// is consulted. Tools that are not found are omitted from the registry
    /// and reported by [`ToolRegistry::require`].
    pub fn discover(config: &ToolsConfig) -> Self {
        let mut tools = HashMap::new();

        for &name in KNOWN_TOOLS {
            let resolved = match config.override_for(name) {
                Some(p) if p.is_file() => Some(p.to_path_buf()),
                Some(p) => {
                    tracing::warn!(
                        "{name} override {} does not exist; searching PATH",
                        p.display()
                    );
                    which::which(name).ok()
                }
                None => which::which(name).ok(),
            };

            match resolved {
                Some(path) => {
                    tracing::debug!("resolved {name} to {}", path.display());
                    tools.insert(
                        name.to_string(),
                        ToolConfig {
                            name: name.to_string(),
                            path,
                        },
                    );
                }
                None => tracing::debug!("{name} not found"),
            }
        }

        Self { tools }
    }

    /// Return the [`ToolConfig`] for `name`, or [`Error::ToolNotFound`] if it
    /// was not found during discovery.
    pub fn require(&self, name: &str) -> Result<&ToolConfig> {
        self.tools
            .get(name)
            .ok_or_else(|| Error::tool_not_found(name))
    }

    /// Check all known tools and return availability information.
    pub fn check_all(&self) -> Vec<ToolInfo> {
        KNOWN_TOOLS
            .iter()
            .map(|&name| match self.tools.get(name) {
                Some(cfg) => ToolInfo {
                    name: name.to_string(),
                    available: true,
                    version: detect_version(&cfg.path),
                    path: Some(cfg.path.clone()),
                },
                None => ToolInfo {
                    name: name.to_string(),
                    available: false,
                    version: None,
                    path: None,
                },
            })
            .collect()
    }
}

/// Run `<tool> -version` and return the first line of stdout.
fn detect_version(path: &Path) -> Option<String> {
    let output = std::process::Command::new(path)
        .arg("-version")
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(|s| s.to_string())
}
