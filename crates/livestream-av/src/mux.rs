//! Stream-copy muxing of one audio and one video elementary stream.

use crate::{tools, Error, Result, FFMPEG_BINARY_ENV};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Combines an audio stream and a video stream into one container file.
///
/// Implementations must not re-encode and must not overwrite an existing
/// `output`; choosing a free output path is the caller's job.
pub trait Muxer {
    fn mux(&self, audio: &Path, video: &Path, output: &Path) -> Result<()>;
}

/// [`Muxer`] backed by the ffmpeg CLI.
#[derive(Debug, Clone)]
pub struct FfmpegMuxer {
    binary: PathBuf,
}

impl FfmpegMuxer {
    /// Use a specific ffmpeg binary without checking it exists.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Locate ffmpeg: the configured path, then `$FFMPEG_BINARY`, then `PATH`.
    pub fn discover(configured: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(FFMPEG_BINARY_ENV).map(PathBuf::from);
        let preferred = configured.map(Path::to_path_buf).or(from_env);
        let binary = tools::get_tool_path("ffmpeg", preferred.as_deref())?;
        tracing::debug!("Using ffmpeg at {:?}", binary);
        Ok(Self { binary })
    }

    /// Path of the ffmpeg binary in use.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn command(&self, audio: &Path, video: &Path, output: &Path) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(["-loglevel", "error", "-nostdin", "-n"])
            .arg("-i")
            .arg(audio)
            .arg("-i")
            .arg(video)
            .args(["-c:v", "copy", "-c:a", "copy"])
            .arg(output);
        cmd
    }
}

impl Muxer for FfmpegMuxer {
    fn mux(&self, audio: &Path, video: &Path, output: &Path) -> Result<()> {
        for input in [audio, video] {
            if !input.is_file() {
                return Err(Error::file_not_found(input));
            }
        }

        let mut cmd = self.command(audio, video, output);
        tracing::info!(
            "Executing: {:?} {}",
            cmd.get_program(),
            cmd.get_args()
                .map(|a| a.to_string_lossy())
                .collect::<Vec<_>>()
                .join(" ")
        );

        let result = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::tool_not_found(self.binary.display().to_string())
            } else {
                Error::Io(e)
            }
        })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            let code = result
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "signal".to_string());
            return Err(Error::tool_failed(
                "ffmpeg",
                format!("exited with code {}: {}", code, stderr.trim()),
            ));
        }

        Ok(())
    }
}
