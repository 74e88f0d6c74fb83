//! # livestream-av
//!
//! External tool handling for livestream-dl.
//!
//! This crate provides functionality for:
//! - Locating and version-checking external tools (ffmpeg)
//! - Muxing one audio and one video elementary stream into a container
//!   without re-encoding
//!
//! ## Example
//!
//! ```no_run
//! use livestream_av::{FfmpegMuxer, Muxer};
//! use std::path::Path;
//!
//! let muxer = FfmpegMuxer::discover(None)?;
//! muxer.mux(
//!     Path::new("source_1_0_m4a.tmp"),
//!     Path::new("source_1_0_mp4.tmp"),
//!     Path::new("broadcast.mp4"),
//! )?;
//! # Ok::<(), livestream_av::Error>(())
//! ```

mod error;
pub mod mux;
pub mod tools;

// Re-exports
pub use error::{Error, Result};
pub use mux::{FfmpegMuxer, Muxer};
pub use tools::{check_tool, check_tools, get_tool_path, require_tool, ToolInfo};

/// Environment variable consulted for the ffmpeg binary when none is configured.
pub const FFMPEG_BINARY_ENV: &str = "FFMPEG_BINARY";
