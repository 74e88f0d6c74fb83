//! Livestream-Media: MP4/fMP4 chunk inspection
//!
//! DASH livestreams are fetched as fragmented MP4 chunks. An initialisation
//! chunk carries a `moov` box describing the track (codec, width, height);
//! media chunks carry `moof`/`mdat` pairs only. This crate reads just enough of
//! that structure to tell whether a chunk starts a new codec context and at
//! what geometry, which is how resolution changes inside one broadcast are
//! detected when no segment metadata was recorded.
//!
//! # Modules
//!
//! - `mp4` - Box walking and `moov`/`trak` parsing
//! - `fixtures` - Builders for synthetic chunks, used by tests across the workspace

pub mod error;
pub mod fixtures;
pub mod mp4;

pub use error::{Error, Result};
pub use mp4::{probe_geometry, ChunkInfo, Geometry};
