//! Audio handling: decoding, resampling, normalization, WAV output
//!
//! Every pipeline stage exchanges audio as an [`AudioArtifact`]: a
//! scratch file plus enough metadata to interpret it. Stages never
//! mutate an artifact in place; each transformation produces a new one.

pub mod loader;
pub mod normalizer;
pub mod resampler;
pub mod writer;

pub use loader::{AudioLoader, DecodedAudio};
pub use normalizer::AudioNormalizer;
pub use resampler::Resampler;

use std::path::PathBuf;

/// Container format of an on-disk audio artifact
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactFormat {
    /// Lossless PCM WAV container
    Wav,
    /// Compressed MPEG layer III container
    Mp3,
    /// FLAC container
    Flac,
    /// Ogg container (Vorbis or Opus)
    Ogg,
}

impl ArtifactFormat {
    /// File extension conventionally used for this container
    pub fn extension(&self) -> &'static str {
        match self {
            ArtifactFormat::Wav => "wav",
            ArtifactFormat::Mp3 => "mp3",
            ArtifactFormat::Flac => "flac",
            ArtifactFormat::Ogg => "ogg",
        }
    }

    /// MIME type for delivery
    pub fn mime_type(&self) -> &'static str {
        match self {
            ArtifactFormat::Wav => "audio/wav",
            ArtifactFormat::Mp3 => "audio/mpeg",
            ArtifactFormat::Flac => "audio/flac",
            ArtifactFormat::Ogg => "audio/ogg",
        }
    }
}

/// An audio payload produced at a pipeline stage boundary
///
/// Artifacts are append-only: a stage consumes one and produces a new
/// one, never rewriting its input. Any artifact not reached by the
/// successful path is scratch garbage and is reclaimed by the job's
/// janitor.
#[derive(Debug, Clone)]
pub struct AudioArtifact {
    /// On-disk location (scratch-owned unless it is a configured input)
    pub path: PathBuf,
    /// Container format
    pub format: ArtifactFormat,
    /// Sample rate, when known
    pub sample_rate: Option<u32>,
    /// Approximate duration in seconds, when known
    pub duration_hint: Option<f32>,
}

impl AudioArtifact {
    pub fn new(path: impl Into<PathBuf>, format: ArtifactFormat) -> Self {
        Self {
            path: path.into(),
            format,
            sample_rate: None,
            duration_hint: None,
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = Some(sample_rate);
        self
    }

    pub fn with_duration(mut self, seconds: f32) -> Self {
        self.duration_hint = Some(seconds);
        self
    }
}
