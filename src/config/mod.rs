mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Default config locations, in search order.
const DEFAULT_PATHS: &[&str] = &[
    "./aac2alac.toml",
    "~/.config/aac2alac/config.toml",
    "/etc/aac2alac/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            tracing::debug!("using config {}", path.display());
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
fn validate_config(config: &Config) -> Result<()> {
    if config.conversion.threads == Some(0) {
        anyhow::bail!("conversion.threads must be at least 1");
    }

    if config.conversion.timeout_secs == 0 {
        anyhow::bail!("conversion.timeout_secs cannot be 0");
    }

    for (name, path) in [
        ("ffmpeg_path", &config.tools.ffmpeg_path),
        ("ffprobe_path", &config.tools.ffprobe_path),
    ] {
        if let Some(path) = path {
            if !path.exists() {
                tracing::warn!("tools.{name} does not exist: {:?}", path);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;

    #[test]
    fn defaults_without_sections() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.conversion.overwrite);
        assert_eq!(config.conversion.timeout_secs, 86_400);
        assert_eq!(config.conversion.threads, None);
        assert_eq!(config.tools.ffmpeg_path, None);
    }

    #[test]
    fn loads_full_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aac2alac.toml");
        fs::write(
            &path,
            r#"
[tools]
ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg"

[conversion]
overwrite = false
threads = 2
mux_flags = "+faststart+use_metadata_tags"
timeout_secs = 600
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(
            config.tools.ffmpeg_path,
            Some(PathBuf::from("/opt/ffmpeg/bin/ffmpeg"))
        );
        assert!(!config.conversion.overwrite);
        assert_eq!(config.conversion.threads, Some(2));
        assert_eq!(
            config.conversion.mux_flags.as_deref(),
            Some("+faststart+use_metadata_tags")
        );
        assert_eq!(config.conversion.timeout().as_secs(), 600);
    }

    #[test]
    fn rejects_zero_threads_and_timeout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");

        fs::write(&path, "[conversion]\nthreads = 0\n").unwrap();
        assert!(load_config(&path).is_err());

        fs::write(&path, "[conversion]\ntimeout_secs = 0\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[conversion\n").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("broken.toml"));
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        assert!(load_config_or_default(Some(Path::new("/nonexistent/aac2alac.toml"))).is_err());
    }
}
