//! Path utilities for segment chunk files and output naming.
//!
//! The segment fetcher writes chunks as `{stream_id}-{index}.m4v` and
//! `{stream_id}-{index}.m4a`; older fetchers also write a literal
//! `{stream_id}-init.m4v` initialisation chunk.

use crate::SegmentKind;
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.+-(?P<idx>[0-9]+)\.[a-z0-9]+$").expect("static regex"));

/// Extract the numbered index from a chunk file name for sorting.
///
/// Names that do not end in `-{digits}.{ext}` (including `-init` chunks)
/// return `-1` so that they sort before every numbered chunk.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use livestream_common::paths::segment_index;
///
/// assert_eq!(segment_index(Path::new("/dl/1784-0.m4v")), 0);
/// assert_eq!(segment_index(Path::new("1784-117.m4a")), 117);
/// assert_eq!(segment_index(Path::new("1784-init.m4v")), -1);
/// ```
pub fn segment_index(path: &Path) -> i64 {
    path.file_name()
        .and_then(|name| name.to_str())
        .and_then(|name| INDEX_RE.captures(name))
        .and_then(|caps| caps.name("idx"))
        .and_then(|idx| idx.as_str().parse().ok())
        .unwrap_or(-1)
}

/// File name of a chunk for a stream, e.g. `chunk_name("17", "5", Video)` is `17-5.m4v`.
pub fn chunk_name(stream_id: &str, index: &str, kind: SegmentKind) -> String {
    format!("{}-{}.{}", stream_id, index, kind.extension())
}

/// Whether `path` names a chunk belonging to `stream_id`.
pub fn is_stream_chunk(path: &Path, stream_id: &str) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| {
            name.strip_prefix(stream_id)
                .is_some_and(|rest| rest.starts_with('-'))
        })
        .unwrap_or(false)
}

/// Path of the audio chunk paired with a video chunk (`.m4v` -> `.m4a`).
pub fn audio_counterpart(video: &Path) -> PathBuf {
    video.with_extension(SegmentKind::Audio.extension())
}

/// Replace the extension of a path, e.g. `out-1.mp4` -> `out-1.srt`.
pub fn with_extension(path: &Path, ext: &str) -> PathBuf {
    path.with_extension(ext)
}

/// Return `desired` if nothing exists there, otherwise the first free
/// `{stem}-{n}.{ext}` for n = 1, 2, ...
///
/// # Examples
///
/// ```
/// use livestream_common::paths::safe_file_path;
/// use std::path::Path;
///
/// let dir = tempfile::tempdir().unwrap();
/// let desired = dir.path().join("out.mp4");
/// assert_eq!(safe_file_path(&desired), desired);
///
/// std::fs::write(&desired, b"").unwrap();
/// assert_eq!(safe_file_path(&desired), dir.path().join("out-1.mp4"));
/// ```
pub fn safe_file_path(desired: &Path) -> PathBuf {
    if !desired.exists() {
        return desired.to_path_buf();
    }

    let parent = desired.parent().unwrap_or_else(|| Path::new(""));
    let stem = desired
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = desired.extension().map(|e| e.to_string_lossy().into_owned());

    (1u64..)
        .map(|n| match &ext {
            Some(ext) => parent.join(format!("{}-{}.{}", stem, n, ext)),
            None => parent.join(format!("{}-{}", stem, n)),
        })
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| desired.to_path_buf())
}
