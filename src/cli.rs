use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "livestream-dl")]
#[command(author, version, about = "Assemble downloaded livestream segments into video")]
pub struct Cli {
    /// Path to config file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Do not read any config file
    #[arg(long, global = true, conflicts_with = "config")]
    pub ignore_config: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write log output to this file
    #[arg(long, global = true)]
    pub log: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Assemble downloaded segments into a video file
    Assemble {
        /// Broadcast metadata JSON written by the downloader
        #[arg(required = true)]
        broadcast_json: PathBuf,

        /// Folder containing the downloaded segments
        #[arg(short = 'o', long)]
        segments_dir: PathBuf,

        /// File path for the generated video (default: generated from filename_format)
        #[arg(short = 'f', long)]
        output: Option<PathBuf>,

        /// Comments JSON to convert into captions
        #[arg(short = 'c', long)]
        comments: Option<PathBuf>,

        /// Delete intermediate streams and segments after a successful mux
        #[arg(long)]
        cleanup: bool,

        /// Only concatenate segments; do not run ffmpeg
        #[arg(long)]
        skip_mux: bool,

        /// Known-good init segment to substitute for a corrupt `{id}-init.m4v`
        #[arg(long)]
        repair_init: Option<PathBuf>,
    },

    /// Generate a caption file from collected comments
    Captions {
        /// Broadcast metadata JSON written by the downloader
        #[arg(required = true)]
        broadcast_json: PathBuf,

        /// Comments JSON
        #[arg(required = true)]
        comments_json: PathBuf,

        /// Where to write the .srt file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses --config or defaults if not specified)
        #[arg(value_name = "CONFIG")]
        file: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
