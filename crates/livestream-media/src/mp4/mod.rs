//! MP4 chunk parsing.
//!
//! This module provides structures for inspecting fetched DASH chunks to find
//! codec-initialisation boundaries and video geometry.

mod atoms;
mod reader;

pub use atoms::{Atom, AtomType, HandlerType, TrackInfo};
pub use reader::Mp4Reader;

use crate::Result;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

/// Video frame geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Geometry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Top-level structure of one chunk.
#[derive(Debug, Default)]
pub struct ChunkInfo {
    /// The chunk carries a `moov` box (it is, or starts with, an init segment).
    pub has_init: bool,
    /// The chunk carries at least one `moof` fragment.
    pub has_fragment: bool,
    /// First video track described by `moov`, if any.
    pub video_track: Option<TrackInfo>,
}

impl ChunkInfo {
    /// Parse a chunk from the given path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);
        Self::parse(&mut reader)
    }

    /// Parse a chunk from a reader.
    pub fn parse<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        Mp4Reader::new(reader)?.parse()
    }

    /// Geometry of the video track, preferring the coded size from the sample
    /// entry and falling back to the track header.
    pub fn geometry(&self) -> Option<Geometry> {
        let track = self.video_track.as_ref()?;
        let coded = track.coded_width.zip(track.coded_height);
        let presented = track.width.zip(track.height);

        coded
            .filter(|(w, h)| *w > 0 && *h > 0)
            .or(presented.filter(|(w, h)| *w > 0 && *h > 0))
            .map(|(width, height)| Geometry { width, height })
    }
}

/// Read the video geometry a chunk declares.
///
/// Returns `Ok(None)` for well-formed chunks that carry no `moov` (plain media
/// fragments inherit the geometry of the last init segment) and `Err` when the
/// chunk cannot be read or is not an MP4 box stream.
pub fn probe_geometry<P: AsRef<Path>>(path: P) -> Result<Option<Geometry>> {
    let info = ChunkInfo::open(path.as_ref())?;
    let geometry = info.geometry();
    tracing::trace!(
        "Probed {:?}: init={} fragment={} geometry={:?}",
        path.as_ref(),
        info.has_init,
        info.has_fragment,
        geometry
    );
    Ok(geometry)
}
