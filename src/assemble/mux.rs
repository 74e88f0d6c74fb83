//! Per-generation muxing with collision-free output names.

use super::{AssembleError, Result};
use livestream_av::Muxer;
use livestream_common::paths::safe_file_path;
use std::path::{Path, PathBuf};

/// Runs the muxer for one generation at a time.
pub struct MuxCoordinator<'a> {
    muxer: &'a dyn Muxer,
    cleanup: bool,
}

impl<'a> MuxCoordinator<'a> {
    pub fn new(muxer: &'a dyn Muxer, cleanup: bool) -> Self {
        Self { muxer, cleanup }
    }

    /// Mux `audio` and `video` into a free path derived from `desired`.
    ///
    /// Never overwrites an existing file: `out.mp4` becomes `out-1.mp4`,
    /// `out-2.mp4`, ... On success with cleanup enabled, the two inputs
    /// are deleted.
    pub fn mux(&self, audio: &Path, video: &Path, desired: &Path) -> Result<PathBuf> {
        let output = safe_file_path(desired);
        if output != desired {
            tracing::debug!("{:?} exists, writing {:?}", desired, output);
        }

        if let Err(e) = self.muxer.mux(audio, video, &output) {
            // `output` was free before the call, so anything there now is partial.
            if output.exists() {
                if let Err(remove) = std::fs::remove_file(&output) {
                    tracing::warn!("Failed to remove partial {:?}: {}", output, remove);
                }
            }
            return Err(e.into());
        }

        if !output.is_file() {
            return Err(AssembleError::MissingOutput { path: output });
        }

        tracing::info!("Generated file: {}", output.display());

        if self.cleanup {
            for intermediate in [audio, video] {
                if let Err(e) = std::fs::remove_file(intermediate) {
                    tracing::warn!("Failed to remove {:?}: {}", intermediate, e);
                }
            }
        }

        Ok(output)
    }
}
