//! Partitioning of an ordered chunk list into resolution generations.
//!
//! A generation is a contiguous run of chunks sharing one resolution (or
//! codec-init context) and is assembled into its own output file.

use super::index::SegmentRef;
use livestream_common::paths::chunk_name;
use livestream_common::{BroadcastMeta, SegmentKind};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// How a resolution boundary is recognised. Chosen once per run.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryDetector {
    /// Old fetcher output with a literal `{id}-init.m4v`: never split.
    FixedSingleGeneration,
    /// Resolution labels recorded by the fetcher, keyed by chunk file name.
    MetadataLookup(BTreeMap<String, String>),
    /// Read the geometry from each chunk's init boxes.
    ProbeDecode,
}

impl BoundaryDetector {
    /// Pick the detector for a segment directory.
    ///
    /// Recorded segment metadata wins; otherwise an `{id}-init.m4v` file
    /// marks pre-v034 output; otherwise chunks are probed.
    pub fn select(segments_dir: &Path, meta: &BroadcastMeta) -> Self {
        if let Some(labels) = meta.segment_labels() {
            return Self::MetadataLookup(labels.clone());
        }
        if segments_dir.join(chunk_name(&meta.id, "init", SegmentKind::Video)).is_file() {
            return Self::FixedSingleGeneration;
        }
        Self::ProbeDecode
    }

    pub fn is_pre_v034(&self) -> bool {
        matches!(self, Self::FixedSingleGeneration)
    }

    /// Resolution context established by a chunk, if it establishes one.
    ///
    /// `None` means the chunk continues the current generation.
    fn boundary_key(&self, segment: &SegmentRef, video: &Path) -> Option<String> {
        match self {
            Self::FixedSingleGeneration => None,
            Self::MetadataLookup(labels) => labels.get(segment.file_name()).cloned(),
            Self::ProbeDecode => match livestream_media::probe_geometry(video) {
                Ok(geometry) => geometry.map(|g| g.to_string()),
                Err(e) => {
                    tracing::warn!(
                        "Unable to probe {:?}, appending to current stream: {}",
                        video,
                        e
                    );
                    None
                }
            },
        }
    }
}

impl std::fmt::Display for BoundaryDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FixedSingleGeneration => write!(f, "pre-v034 single stream"),
            Self::MetadataLookup(_) => write!(f, "segment metadata"),
            Self::ProbeDecode => write!(f, "chunk probing"),
        }
    }
}

/// Opt-in patch for known-corrupt output of early fetchers.
///
/// Replaces the video of `{id}-init.m4v` with a known-good init segment and,
/// unless the run is pre-v034, drops `{id}-0.m4v` entirely. This discards
/// data, so it is never applied unless requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepairPolicy {
    pub init_segment: PathBuf,
}

impl RepairPolicy {
    pub fn new(init_segment: impl Into<PathBuf>) -> Self {
        Self {
            init_segment: init_segment.into(),
        }
    }
}

/// One audio/video chunk pair queued for concatenation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkPair {
    pub sequence_index: i64,
    pub audio: PathBuf,
    pub video: PathBuf,
}

/// A contiguous group of chunks and the intermediate files it is written to.
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub index: usize,
    /// Resolution label or probed geometry, when known.
    pub label: Option<String>,
    pub chunks: Vec<ChunkPair>,
    pub audio_path: PathBuf,
    pub video_path: PathBuf,
}

impl Generation {
    fn new(index: usize, label: Option<String>, dir: &Path, stream_id: &str) -> Self {
        Self {
            index,
            label,
            chunks: Vec::new(),
            audio_path: dir.join(format!("source_{}_{}_m4a.tmp", stream_id, index)),
            video_path: dir.join(format!("source_{}_{}_mp4.tmp", stream_id, index)),
        }
    }
}

/// Splits ordered chunks into generations.
#[derive(Debug, Clone)]
pub struct StreamSplitter {
    segments_dir: PathBuf,
    stream_id: String,
    detector: BoundaryDetector,
    repair: Option<RepairPolicy>,
}

impl StreamSplitter {
    pub fn new(segments_dir: &Path, meta: &BroadcastMeta, repair: Option<RepairPolicy>) -> Self {
        Self::with_detector(
            segments_dir,
            &meta.id,
            BoundaryDetector::select(segments_dir, meta),
            repair,
        )
    }

    pub fn with_detector(
        segments_dir: &Path,
        stream_id: &str,
        detector: BoundaryDetector,
        repair: Option<RepairPolicy>,
    ) -> Self {
        Self {
            segments_dir: segments_dir.to_path_buf(),
            stream_id: stream_id.to_string(),
            detector,
            repair,
        }
    }

    pub fn detector(&self) -> &BoundaryDetector {
        &self.detector
    }

    /// Partition `segments`, which must already be in index order.
    pub fn split(&self, segments: &[SegmentRef]) -> Vec<Generation> {
        tracing::info!("Splitting {} segments by {}", segments.len(), self.detector);

        let mut generations: Vec<Generation> = Vec::new();
        let mut last_key: Option<String> = None;

        for segment in segments {
            let Some(pair) = self.chunk_pair(segment) else {
                continue;
            };

            let key = self.detector.boundary_key(segment, &pair.video);
            let opens = match (generations.last(), &key) {
                (None, _) => true,
                (Some(_), Some(key)) => last_key.as_ref() != Some(key),
                (Some(_), None) => false,
            };

            if opens {
                let index = generations.len();
                if index > 0 {
                    tracing::info!(
                        "Resolution change at segment {} ({:?} -> {:?}), starting stream {}",
                        pair.sequence_index,
                        last_key,
                        key,
                        index
                    );
                }
                generations.push(Generation::new(
                    index,
                    key.clone(),
                    &self.segments_dir,
                    &self.stream_id,
                ));
            }
            if key.is_some() {
                last_key = key;
            }

            if let Some(current) = generations.last_mut() {
                if current.label.is_none() {
                    current.label = last_key.clone();
                }
                current.chunks.push(pair);
            }
        }

        generations
    }

    /// Apply the repair policy to one chunk. `None` drops it.
    fn chunk_pair(&self, segment: &SegmentRef) -> Option<ChunkPair> {
        let audio = segment.audio().path;
        let mut video = segment.path.clone();

        if let Some(repair) = &self.repair {
            let name = segment.file_name();
            if name == chunk_name(&self.stream_id, "init", SegmentKind::Video) {
                tracing::info!("Replacing {} with {:?}", name, repair.init_segment);
                video = repair.init_segment.clone();
            } else if name == chunk_name(&self.stream_id, "0", SegmentKind::Video)
                && !self.detector.is_pre_v034()
            {
                tracing::warn!("Dropping {} (repair policy)", name);
                return None;
            }
        }

        Some(ChunkPair {
            sequence_index: segment.sequence_index,
            audio,
            video,
        })
    }
}
