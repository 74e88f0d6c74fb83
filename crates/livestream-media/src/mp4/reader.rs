//! Chunk reader with atom parsing.

use super::{Atom, AtomType, ChunkInfo, HandlerType, TrackInfo};
use crate::{Error, Result};
use std::io::{Read, Seek, SeekFrom};

/// Maximum allowed atom data size read into memory (1 MB). Only header boxes
/// are ever read whole; `mdat` payloads are skipped.
const MAX_ATOM_DATA_SIZE: u64 = 1024 * 1024;

/// Reader over one fetched chunk.
pub struct Mp4Reader<R> {
    reader: R,
    file_size: u64,
}

impl<R: Read + Seek> Mp4Reader<R> {
    /// Create a new reader.
    pub fn new(mut reader: R) -> Result<Self> {
        let file_size = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(0))?;
        Ok(Self { reader, file_size })
    }

    /// Parse the chunk's top-level structure.
    pub fn parse(&mut self) -> Result<ChunkInfo> {
        let atoms = self.read_atoms(0, self.file_size)?;

        let first = atoms
            .first()
            .ok_or_else(|| Error::invalid_mp4("no boxes found"))?;
        if !first.atom_type.is_top_level() {
            return Err(Error::invalid_mp4(format!(
                "unexpected leading box '{}'",
                first.atom_type
            )));
        }

        let mut info = ChunkInfo::default();

        for atom in &atoms {
            match atom.atom_type {
                AtomType::MOOV => {
                    info.has_init = true;
                    self.parse_moov(atom, &mut info)?;
                }
                AtomType::MOOF => info.has_fragment = true,
                _ => {}
            }
        }

        Ok(info)
    }

    /// Read atoms between `start` and `end`.
    fn read_atoms(&mut self, start: u64, end: u64) -> Result<Vec<Atom>> {
        let mut atoms = Vec::new();
        let mut pos = start;

        while pos + 8 <= end {
            self.reader.seek(SeekFrom::Start(pos))?;

            let mut header = [0u8; 8];
            self.reader.read_exact(&mut header)?;

            let size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
            let atom_type = AtomType::from_bytes([header[4], header[5], header[6], header[7]]);

            let (actual_size, header_size) = if size == 1 {
                // 64-bit extended size
                let mut ext = [0u8; 8];
                self.reader.read_exact(&mut ext)?;
                (u64::from_be_bytes(ext), 16u8)
            } else if size == 0 {
                // Atom extends to end of its parent
                (end - pos, 8u8)
            } else {
                (size, 8u8)
            };

            if actual_size < header_size as u64 {
                return Err(Error::invalid_mp4(format!(
                    "box '{}' at {} has size {}",
                    atom_type, pos, actual_size
                )));
            }
            if actual_size > end - pos {
                return Err(Error::invalid_mp4(format!(
                    "box '{}' at {} is truncated",
                    atom_type, pos
                )));
            }

            atoms.push(Atom {
                atom_type,
                size: actual_size,
                data_offset: pos + header_size as u64,
                header_size,
            });

            pos += actual_size;
        }

        Ok(atoms)
    }

    /// Read and validate atom data, rejecting oversized atoms.
    fn read_atom_data(&mut self, atom: &Atom) -> Result<Vec<u8>> {
        let size = atom.data_size();
        if size > MAX_ATOM_DATA_SIZE {
            return Err(Error::invalid_mp4(format!(
                "Atom {} data size {} exceeds maximum {}",
                atom.atom_type, size, MAX_ATOM_DATA_SIZE
            )));
        }
        self.reader.seek(SeekFrom::Start(atom.data_offset))?;
        let mut data = vec![0u8; size as usize];
        self.reader.read_exact(&mut data)?;
        Ok(data)
    }

    /// Parse moov atom, keeping the first video track.
    fn parse_moov(&mut self, moov: &Atom, info: &mut ChunkInfo) -> Result<()> {
        let children = self.read_atoms(moov.data_offset, moov.end())?;

        for child in &children {
            if child.atom_type == AtomType::TRAK {
                let track = self.parse_trak(child)?;
                if track.handler_type.is_video() && info.video_track.is_none() {
                    info.video_track = Some(track);
                }
            }
        }

        Ok(())
    }

    /// Parse trak (track) atom.
    fn parse_trak(&mut self, trak: &Atom) -> Result<TrackInfo> {
        let children = self.read_atoms(trak.data_offset, trak.end())?;

        let mut track = TrackInfo::new(0);

        for child in &children {
            match child.atom_type {
                AtomType::TKHD => self.parse_tkhd(child, &mut track)?,
                AtomType::MDIA => self.parse_mdia(child, &mut track)?,
                _ => {}
            }
        }

        Ok(track)
    }

    /// Parse tkhd (track header).
    fn parse_tkhd(&mut self, atom: &Atom, track: &mut TrackInfo) -> Result<()> {
        let data = self.read_atom_data(atom)?;

        if data.is_empty() {
            return Ok(());
        }

        // Width and height are 16.16 fixed point at the end of the box
        let (id_at, dims_at) = if data[0] == 0 { (12, 76) } else { (20, 84) };

        if let Some(id) = be_u32(&data, id_at) {
            track.track_id = id;
        }
        if let (Some(w), Some(h)) = (be_u32(&data, dims_at), be_u32(&data, dims_at + 4)) {
            track.width = Some(w >> 16);
            track.height = Some(h >> 16);
        }

        Ok(())
    }

    /// Parse mdia (media) atom.
    fn parse_mdia(&mut self, mdia: &Atom, track: &mut TrackInfo) -> Result<()> {
        let children = self.read_atoms(mdia.data_offset, mdia.end())?;

        for child in &children {
            match child.atom_type {
                AtomType::MDHD => self.parse_mdhd(child, track)?,
                AtomType::HDLR => self.parse_hdlr(child, track)?,
                AtomType::MINF => self.parse_minf(child, track)?,
                _ => {}
            }
        }

        Ok(())
    }

    /// Parse mdhd (media header).
    fn parse_mdhd(&mut self, atom: &Atom, track: &mut TrackInfo) -> Result<()> {
        let data = self.read_atom_data(atom)?;

        if data.is_empty() {
            return Ok(());
        }

        let timescale_at = if data[0] == 0 { 12 } else { 20 };
        if let Some(timescale) = be_u32(&data, timescale_at) {
            track.timescale = timescale;
        }

        Ok(())
    }

    /// Parse hdlr (handler) atom.
    fn parse_hdlr(&mut self, atom: &Atom, track: &mut TrackInfo) -> Result<()> {
        let data = self.read_atom_data(atom)?;

        if data.len() >= 12 {
            track.handler_type = HandlerType::from_bytes([data[8], data[9], data[10], data[11]]);
        }

        Ok(())
    }

    /// Parse minf (media info) atom.
    fn parse_minf(&mut self, minf: &Atom, track: &mut TrackInfo) -> Result<()> {
        let children = self.read_atoms(minf.data_offset, minf.end())?;

        for child in &children {
            if child.atom_type == AtomType::STBL {
                let grandchildren = self.read_atoms(child.data_offset, child.end())?;
                for entry in &grandchildren {
                    if entry.atom_type == AtomType::STSD {
                        self.parse_stsd(entry, track)?;
                    }
                }
            }
        }

        Ok(())
    }

    /// Parse stsd (sample description) - codec and coded size of the first entry.
    fn parse_stsd(&mut self, atom: &Atom, track: &mut TrackInfo) -> Result<()> {
        let data = self.read_atom_data(atom)?;

        // version/flags (4), entry count (4), then the first sample entry box
        if data.len() < 16 {
            return Ok(());
        }
        track.codec = Some(AtomType::from_bytes([data[12], data[13], data[14], data[15]]));

        // VisualSampleEntry: 8 box header, 8 SampleEntry, 16 reserved, then width/height
        if track.handler_type.is_video() && data.len() >= 44 {
            track.coded_width = Some(u16::from_be_bytes([data[40], data[41]]) as u32);
            track.coded_height = Some(u16::from_be_bytes([data[42], data[43]]) as u32);
        }

        Ok(())
    }
}

fn be_u32(data: &[u8], at: usize) -> Option<u32> {
    data.get(at..at + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
}
