//! Delivery-format transcoding
//!
//! The pipeline's raw artifact is canonical WAV; delivery is MP3 by
//! default. Encoding is delegated to ffmpeg as a child process with
//! argv-only arguments.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::audio::{ArtifactFormat, AudioArtifact};
use crate::core::ConversionError;

/// Formats the service can hand back to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryFormat {
    Mp3,
    Wav,
}

impl DeliveryFormat {
    pub fn artifact_format(&self) -> ArtifactFormat {
        match self {
            DeliveryFormat::Mp3 => ArtifactFormat::Mp3,
            DeliveryFormat::Wav => ArtifactFormat::Wav,
        }
    }
}

/// Converts a raw artifact into its delivery form
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Encode `input` as `target`, writing the result to `out_path`.
    async fn transcode(
        &self,
        input: &AudioArtifact,
        target: DeliveryFormat,
        out_path: &Path,
    ) -> Result<AudioArtifact, ConversionError>;
}

/// ffmpeg-backed transcoder
pub struct FfmpegTranscoder {
    ffmpeg: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(ffmpeg: impl Into<PathBuf>) -> Self {
        Self {
            ffmpeg: ffmpeg.into(),
        }
    }
}

#[async_trait]
impl Transcoder for FfmpegTranscoder {
    async fn transcode(
        &self,
        input: &AudioArtifact,
        target: DeliveryFormat,
        out_path: &Path,
    ) -> Result<AudioArtifact, ConversionError> {
        // WAV delivery of a WAV artifact needs no encoder at all.
        if target == DeliveryFormat::Wav && input.format == ArtifactFormat::Wav {
            tokio::fs::copy(&input.path, out_path)
                .await
                .map_err(|e| ConversionError::IoFailure {
                    message: format!("failed to copy wav artifact: {}", e),
                })?;
            return Ok(AudioArtifact::new(out_path.to_path_buf(), ArtifactFormat::Wav));
        }

        let mut cmd = Command::new(&self.ffmpeg);
        cmd.arg("-y")
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(&input.path);
        if target == DeliveryFormat::Mp3 {
            cmd.arg("-codec:a").arg("libmp3lame");
        }
        cmd.arg(out_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(input = %input.path.display(), out = %out_path.display(), "transcoding");

        let output = cmd.output().await.map_err(|e| ConversionError::EncodeFailure {
            message: format!("failed to spawn {}: {}", self.ffmpeg.display(), e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConversionError::EncodeFailure {
                message: format!("ffmpeg exited with {}: {}", output.status, stderr.trim()),
            });
        }

        Ok(AudioArtifact::new(
            out_path.to_path_buf(),
            target.artifact_format(),
        ))
    }
}
