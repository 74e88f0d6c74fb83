//! Livestream-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across livestream-dl:
//!
//! - **Broadcast Types**: The persisted broadcast record and its status enum
//! - **Path Utilities**: Segment index extraction, audio/video pairing and
//!   collision-free output path generation
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use livestream_common::paths::{segment_index, audio_counterpart};
//! use livestream_common::{BroadcastStatus, SegmentKind};
//! use std::path::Path;
//!
//! assert_eq!(segment_index(Path::new("178-42.m4v")), 42);
//! assert_eq!(segment_index(Path::new("178-init.m4v")), -1);
//! assert_eq!(audio_counterpart(Path::new("178-42.m4v")), Path::new("178-42.m4a"));
//! assert_eq!(SegmentKind::Video.extension(), "m4v");
//! assert!(BroadcastStatus::PostLive.is_post_live());
//! ```

pub mod error;
pub mod paths;
pub mod types;

pub use error::{Error, Result};
pub use types::*;
