mod types;

pub use types::*;

use crate::naming;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Locations searched, in order, when no config path is given.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &[
    "./livestream_dl.toml",
    "~/.config/livestream-dl/config.toml",
];

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    expand_paths(&mut config);
    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    for path_str in DEFAULT_CONFIG_PATHS {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

fn expand_paths(config: &mut Config) {
    config.output.dir = expand(&config.output.dir);
    for path in [
        &mut config.tools.ffmpeg_path,
        &mut config.assemble.repair_init_segment,
        &mut config.log_file,
    ]
    .into_iter()
    .flatten()
    {
        *path = expand(path);
    }
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    naming::check_format(&config.output.filename_format)
        .context("Invalid output.filename_format")?;

    if config.comments.poll_interval_secs == 0 {
        anyhow::bail!("comments.poll_interval_secs cannot be 0");
    }

    if !config.comments.default_delay_secs.is_finite() || config.comments.default_delay_secs < 0.0
    {
        anyhow::bail!(
            "comments.default_delay_secs must be a non-negative number, got {}",
            config.comments.default_delay_secs
        );
    }

    if let Some(ref path) = config.assemble.repair_init_segment {
        if !path.is_file() {
            tracing::warn!("Repair init segment does not exist: {:?}", path);
        }
    }

    if let Some(ref path) = config.tools.ffmpeg_path {
        if !path.exists() {
            tracing::warn!("Configured ffmpeg path does not exist: {:?}", path);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::naming::NamingError;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("livestream_dl.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.output.dir, PathBuf::from("downloaded"));
        assert_eq!(
            config.output.filename_format,
            "{year}{month}{day}_{username}_{broadcastid}_{broadcasttype}"
        );
        assert!(!config.output.cleanup);
        assert!(!config.assemble.skip_mux);
        assert_eq!(config.comments.poll_interval_secs, 4);
        assert_eq!(config.comments.default_delay_secs, 10.0);
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let (_dir, path) = write_config(
            r#"
verbose = true

[output]
cleanup = true

[comments]
commenters = ["johndoe", "12345"]
"#,
        );
        let config = load_config(&path).unwrap();
        assert!(config.verbose);
        assert!(config.output.cleanup);
        assert_eq!(config.output.dir, PathBuf::from("downloaded"));
        assert_eq!(config.comments.commenters, vec!["johndoe", "12345"]);
        assert_eq!(config.comments.poll_interval_secs, 4);
    }

    #[test]
    fn test_tilde_expanded() {
        let (_dir, path) = write_config("[tools]\nffmpeg_path = \"~/bin/ffmpeg\"\n");
        let config = load_config(&path).unwrap();
        let ffmpeg = config.tools.ffmpeg_path.unwrap();
        assert!(!ffmpeg.to_string_lossy().starts_with('~'));
        assert!(ffmpeg.ends_with("bin/ffmpeg"));
    }

    #[test]
    fn test_unknown_placeholder_rejected() {
        let (_dir, path) = write_config("[output]\nfilename_format = \"{year}_{title}\"\n");
        let err = load_config(&path).unwrap_err();
        let naming = err
            .chain()
            .find_map(|e| e.downcast_ref::<NamingError>())
            .expect("naming error in chain");
        assert_eq!(naming.exit_code(), 10);
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let mut config = Config::default();
        config.comments.poll_interval_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_negative_delay_rejected() {
        let mut config = Config::default();
        config.comments.default_delay_secs = -1.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_missing_repair_file_only_warns() {
        let mut config = Config::default();
        config.assemble.repair_init_segment = Some(PathBuf::from("/nonexistent/init.m4v"));
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_explicit_missing_path_errors() {
        let err = load_config_or_default(Some(Path::new("/nonexistent/livestream_dl.toml")))
            .unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn test_malformed_file_errors() {
        let (_dir, path) = write_config("[output\ncleanup = true");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
