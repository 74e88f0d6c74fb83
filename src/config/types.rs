use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub tools: ToolsConfig,

    #[serde(default)]
    pub assemble: AssembleConfig,

    #[serde(default)]
    pub comments: CommentsConfig,

    /// Also write log output to this file
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging
    #[serde(default)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Directory generated output names are placed in
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,

    /// Format for generated output names (see `naming::PLACEHOLDERS`)
    #[serde(default = "default_filename_format")]
    pub filename_format: String,

    /// Delete intermediate streams and raw segments after a successful mux
    #[serde(default)]
    pub cleanup: bool,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("downloaded")
}

fn default_filename_format() -> String {
    "{year}{month}{day}_{username}_{broadcastid}_{broadcasttype}".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
            filename_format: default_filename_format(),
            cleanup: false,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ToolsConfig {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AssembleConfig {
    /// Only concatenate; keep the intermediate streams and skip ffmpeg
    #[serde(default)]
    pub skip_mux: bool,

    /// Known-good init segment used to replace `{id}-init.m4v`.
    /// Setting this enables the init-segment repair policy.
    #[serde(default)]
    pub repair_init_segment: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CommentsConfig {
    /// Keep comments from verified users, on by default
    #[serde(default = "default_collect_verified")]
    pub collect_verified: bool,

    /// User ids or usernames whose comments are kept
    #[serde(default)]
    pub commenters: Vec<String>,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Caption delay used when a comments file records no buffered duration
    #[serde(default = "default_delay")]
    pub default_delay_secs: f64,
}

fn default_collect_verified() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    4
}

fn default_delay() -> f64 {
    10.0
}

impl Default for CommentsConfig {
    fn default() -> Self {
        Self {
            collect_verified: default_collect_verified(),
            commenters: Vec::new(),
            poll_interval_secs: default_poll_interval(),
            default_delay_secs: default_delay(),
        }
    }
}
