//! Discovery and ordering of the video chunks available for a broadcast.

use super::{AssembleError, Result};
use livestream_common::paths::{audio_counterpart, segment_index};
use livestream_common::{BroadcastMeta, SegmentKind};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A chunk file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentRef {
    pub stream_id: String,
    /// Numeric index from the file name, `-1` when it has none.
    pub sequence_index: i64,
    pub kind: SegmentKind,
    pub path: PathBuf,
}

impl SegmentRef {
    pub fn new(stream_id: &str, kind: SegmentKind, path: PathBuf) -> Self {
        Self {
            stream_id: stream_id.to_string(),
            sequence_index: segment_index(&path),
            kind,
            path,
        }
    }

    /// The paired audio chunk of a video chunk (same stream and index).
    pub fn audio(&self) -> SegmentRef {
        SegmentRef {
            stream_id: self.stream_id.clone(),
            sequence_index: self.sequence_index,
            kind: SegmentKind::Audio,
            path: audio_counterpart(&self.path),
        }
    }

    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default()
    }
}

/// List the video chunks of `stream_id` in `output_dir`, ordered by index.
///
/// When the broadcast recorded segment metadata its keys are the
/// authoritative chunk set; otherwise `{stream_id}-*.m4v` files are used.
/// Chunks whose audio counterpart is missing are skipped with a warning.
pub fn list_segments(
    output_dir: &Path,
    stream_id: &str,
    meta: &BroadcastMeta,
) -> Result<Vec<SegmentRef>> {
    let candidates = match meta.segment_labels() {
        Some(labels) => labels
            .keys()
            .filter_map(|name| {
                let path = output_dir.join(name);
                if path.is_file() {
                    Some(path)
                } else {
                    tracing::warn!("Segment listed in metadata is missing: {:?}", path);
                    None
                }
            })
            .collect(),
        None => glob_video_chunks(output_dir, stream_id)?,
    };

    let mut segments: Vec<SegmentRef> = candidates
        .into_iter()
        .map(|path| SegmentRef::new(stream_id, SegmentKind::Video, path))
        .filter(|segment| {
            let audio = audio_counterpart(&segment.path);
            if audio.is_file() {
                true
            } else {
                tracing::warn!(
                    "Audio segment missing for {:?}, skipping {:?}",
                    segment.file_name(),
                    audio
                );
                false
            }
        })
        .collect();

    // Stable: equal indices keep discovery order.
    segments.sort_by_key(|s| s.sequence_index);

    tracing::debug!("Found {} segments for stream {}", segments.len(), stream_id);
    Ok(segments)
}

fn glob_video_chunks(output_dir: &Path, stream_id: &str) -> Result<Vec<PathBuf>> {
    let prefix = format!("{}-", stream_id);
    let suffix = format!(".{}", SegmentKind::Video.extension());

    let mut paths = Vec::new();
    for entry in WalkDir::new(output_dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| AssembleError::io(output_dir, e.into()))?;
        let matches = entry
            .file_name()
            .to_str()
            .is_some_and(|n| n.starts_with(&prefix) && n.ends_with(&suffix));
        if matches && entry.file_type().is_file() {
            paths.push(entry.into_path());
        }
    }

    Ok(paths)
}
