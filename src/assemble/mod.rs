//! Segment assembly: index, split, concatenate, mux.
//!
//! Runs strictly in sequence, one generation at a time. Any concatenation or
//! mux failure aborts the remaining generations.

pub mod concat;
pub mod index;
pub mod mux;
pub mod splitter;

pub use index::{list_segments, SegmentRef};
pub use mux::MuxCoordinator;
pub use splitter::{BoundaryDetector, ChunkPair, Generation, RepairPolicy, StreamSplitter};

use crate::captions::{self, CaptionBlock, CommentsFile};
use livestream_av::Muxer;
use livestream_common::paths::{is_stream_chunk, with_extension};
use livestream_common::{BroadcastMeta, BroadcastStatus};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Exit code for a broadcast rejected because of its status.
pub const REJECTED_BROADCAST_EXIT_CODE: u8 = 9;

/// Result type alias for assembly.
pub type Result<T> = std::result::Result<T, AssembleError>;

#[derive(Debug, thiserror::Error)]
pub enum AssembleError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("broadcast with status '{status}' cannot be assembled")]
    RejectedBroadcast { status: BroadcastStatus },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("muxing failed: {0}")]
    Mux(#[from] livestream_av::Error),

    #[error("muxer reported success but {} was not generated", path.display())]
    MissingOutput { path: PathBuf },
}

impl AssembleError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::RejectedBroadcast { .. } => REJECTED_BROADCAST_EXIT_CODE,
            _ => 1,
        }
    }
}

/// Everything one assembly run needs, resolved from CLI and config.
#[derive(Debug, Clone)]
pub struct AssembleOptions {
    /// Directory holding `{id}-{n}.m4v` / `.m4a` chunks.
    pub segments_dir: PathBuf,
    /// Requested video path; later generations get `-1`, `-2`, ... suffixes.
    pub output: PathBuf,
    pub comments: Option<PathBuf>,
    pub cleanup: bool,
    pub skip_mux: bool,
    pub repair: Option<RepairPolicy>,
    /// Caption delay when the comments file records none.
    pub default_comments_delay: f64,
}

impl AssembleOptions {
    pub fn new(segments_dir: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            segments_dir: segments_dir.into(),
            output: output.into(),
            comments: None,
            cleanup: false,
            skip_mux: false,
            repair: None,
            default_comments_delay: 10.0,
        }
    }
}

/// Outcome for one generation.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationReport {
    pub index: usize,
    pub label: Option<String>,
    pub segments: usize,
    pub audio_path: PathBuf,
    pub video_path: PathBuf,
    /// Muxed file; `None` when muxing was skipped.
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssembleReport {
    pub generations: Vec<GenerationReport>,
    pub captions: Vec<PathBuf>,
    /// Raw chunk files deleted by cleanup.
    pub removed_segments: usize,
}

impl AssembleReport {
    pub fn outputs(&self) -> impl Iterator<Item = &Path> {
        self.generations
            .iter()
            .filter_map(|g| g.output.as_deref())
    }
}

/// Drives one broadcast through index, split, concatenation and mux.
///
/// `muxer` may be `None` only when `skip_mux` is set.
pub struct Assembler<'a> {
    options: AssembleOptions,
    muxer: Option<&'a dyn Muxer>,
}

impl<'a> Assembler<'a> {
    pub fn new(options: AssembleOptions, muxer: Option<&'a dyn Muxer>) -> Self {
        Self { options, muxer }
    }

    pub fn run(&self, meta: &BroadcastMeta) -> Result<AssembleReport> {
        let options = &self.options;

        check_status(meta)?;

        let coordinator = match (options.skip_mux, self.muxer) {
            (true, _) => None,
            (false, Some(muxer)) => Some(MuxCoordinator::new(muxer, options.cleanup)),
            (false, None) => {
                return Err(AssembleError::invalid_input(
                    "muxing requested but no muxer was provided",
                ))
            }
        };

        if !options.segments_dir.is_dir() {
            return Err(AssembleError::invalid_input(format!(
                "segments directory does not exist: {}",
                options.segments_dir.display()
            )));
        }

        // Load comments up front so a bad file fails before any work is done.
        let captions = match &options.comments {
            Some(path) => {
                let comments = CommentsFile::load(path).map_err(|e| {
                    AssembleError::invalid_input(format!("cannot load comments: {}", e))
                })?;
                captions::captions_for(meta, &comments, options.default_comments_delay)
            }
            None => Vec::new(),
        };

        let segments = list_segments(&options.segments_dir, &meta.id, meta)?;
        if segments.is_empty() {
            return Err(AssembleError::invalid_input(format!(
                "no segments for broadcast {} in {}",
                meta.id,
                options.segments_dir.display()
            )));
        }

        let splitter = StreamSplitter::new(&options.segments_dir, meta, options.repair.clone());
        let generations = splitter.split(&segments);
        tracing::info!(
            "Assembling {} segments into {} stream(s)",
            segments.len(),
            generations.len()
        );

        if let Some(parent) = options.output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| AssembleError::io(parent, e))?;
            }
        }

        let mut report = AssembleReport::default();

        for generation in &generations {
            concat::concatenate(generation)?;

            let output = match coordinator {
                Some(ref coordinator) => Some(coordinator.mux(
                    &generation.audio_path,
                    &generation.video_path,
                    &options.output,
                )?),
                None => {
                    tracing::info!(
                        "Skipping mux, streams kept at {:?} and {:?}",
                        generation.audio_path,
                        generation.video_path
                    );
                    None
                }
            };

            if let Some(srt) = self.write_captions(output.as_deref(), &captions)? {
                report.captions.push(srt);
            }

            report.generations.push(GenerationReport {
                index: generation.index,
                label: generation.label.clone(),
                segments: generation.chunks.len(),
                audio_path: generation.audio_path.clone(),
                video_path: generation.video_path.clone(),
                output,
            });
        }

        if options.cleanup && !options.skip_mux {
            report.removed_segments = remove_segments(&options.segments_dir, &meta.id);
        }

        Ok(report)
    }

    /// Write captions beside `video`, or beside the requested output when
    /// nothing was muxed. Same captions for every generation.
    fn write_captions(
        &self,
        video: Option<&Path>,
        blocks: &[CaptionBlock],
    ) -> Result<Option<PathBuf>> {
        if blocks.is_empty() {
            return Ok(None);
        }

        let srt = match video {
            Some(video) => with_extension(video, "srt"),
            None => livestream_common::paths::safe_file_path(&with_extension(
                &self.options.output,
                "srt",
            )),
        };

        captions::write_srt(&srt, blocks).map_err(|e| AssembleError::io(&srt, e))?;
        tracing::info!("Comments written to: {}", srt.display());
        Ok(Some(srt))
    }
}

/// Reject broadcasts that cannot be assembled. `run` calls this first;
/// callers may call it earlier to fail before acquiring tools.
pub fn check_status(meta: &BroadcastMeta) -> Result<()> {
    match meta.broadcast_status {
        BroadcastStatus::PostLive => Err(AssembleError::RejectedBroadcast {
            status: meta.broadcast_status,
        }),
        BroadcastStatus::Active => Ok(()),
        status => {
            tracing::warn!("Broadcast {} has status '{}'", meta.id, status);
            Ok(())
        }
    }
}

/// Delete every `{stream_id}-*` file in `dir`. Failures are logged.
fn remove_segments(dir: &Path, stream_id: &str) -> usize {
    tracing::debug!("Cleaning up segments in {:?}...", dir);

    let mut removed = 0;
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_stream_chunk(path, stream_id) {
            continue;
        }
        match std::fs::remove_file(path) {
            Ok(()) => removed += 1,
            Err(e) => tracing::warn!("Failed to remove {:?}: {}", path, e),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        let rejected = AssembleError::RejectedBroadcast {
            status: BroadcastStatus::PostLive,
        };
        assert_eq!(rejected.exit_code(), 9);
        assert_eq!(AssembleError::invalid_input("x").exit_code(), 1);
        assert_eq!(
            AssembleError::MissingOutput {
                path: PathBuf::from("out.mp4")
            }
            .exit_code(),
            1
        );
    }

    #[test]
    fn test_status_check() {
        let mut meta: BroadcastMeta = serde_json::from_str(
            r#"{"id": "17", "published_time": 1000, "broadcast_status": "interrupted"}"#,
        )
        .unwrap();
        assert!(check_status(&meta).is_ok());

        meta.broadcast_status = BroadcastStatus::PostLive;
        assert!(matches!(
            check_status(&meta),
            Err(AssembleError::RejectedBroadcast { .. })
        ));
    }

    #[test]
    fn test_mux_without_muxer_is_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let meta: BroadcastMeta = serde_json::from_str(
            r#"{"id": "17", "published_time": 1000, "broadcast_status": "active"}"#,
        )
        .unwrap();
        let options = AssembleOptions::new(dir.path(), dir.path().join("out.mp4"));

        let err = Assembler::new(options, None).run(&meta).unwrap_err();
        assert!(matches!(err, AssembleError::InvalidInput(_)));
    }

    #[test]
    fn test_remove_segments_only_touches_stream() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["17-0.m4v", "17-0.m4a", "17-init.m4v", "170-0.m4v", "notes.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }

        assert_eq!(remove_segments(dir.path(), "17"), 3);
        assert!(dir.path().join("170-0.m4v").exists());
        assert!(dir.path().join("notes.txt").exists());
    }
}
