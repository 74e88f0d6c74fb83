//! Byte-exact concatenation of chunk files into intermediate streams.

use super::splitter::Generation;
use super::{AssembleError, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;

/// How the destination is opened for one chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Create or truncate; used for the first chunk of a generation.
    Truncate,
    Append,
}

/// Copy the raw bytes of `src` onto `dest`, returning the bytes copied.
pub fn copy_chunk(src: &Path, dest: &Path, mode: WriteMode) -> Result<u64> {
    let mut reader = File::open(src).map_err(|e| chunk_error(src, e))?;

    let mut options = OpenOptions::new();
    match mode {
        WriteMode::Truncate => options.write(true).create(true).truncate(true),
        WriteMode::Append => options.append(true).create(true),
    };
    let mut writer = options.open(dest).map_err(|e| chunk_error(dest, e))?;

    std::io::copy(&mut reader, &mut writer).map_err(|e| chunk_error(src, e))
}

fn chunk_error(path: &Path, e: std::io::Error) -> AssembleError {
    tracing::error!("Error processing {:?}: {}", path, e);
    AssembleError::io(path, e)
}

/// Write a generation's chunks into its audio and video intermediate files.
pub fn concatenate(generation: &Generation) -> Result<()> {
    tracing::info!(
        "Assembling stream {} from {} segments... {:?}",
        generation.index,
        generation.chunks.len(),
        generation.video_path
    );

    let mut video_bytes = 0;
    let mut audio_bytes = 0;
    for (i, chunk) in generation.chunks.iter().enumerate() {
        let mode = if i == 0 {
            WriteMode::Truncate
        } else {
            WriteMode::Append
        };
        video_bytes += copy_chunk(&chunk.video, &generation.video_path, mode)?;
        audio_bytes += copy_chunk(&chunk.audio, &generation.audio_path, mode)?;
    }

    tracing::debug!(
        "Stream {}: {} video bytes, {} audio bytes",
        generation.index,
        video_bytes,
        audio_bytes
    );
    Ok(())
}
