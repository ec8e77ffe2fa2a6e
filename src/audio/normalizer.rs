//! Audio normalization to the engine's canonical input format
//!
//! The synthesis engine expects mono 16-bit PCM WAV at
//! [`crate::CANONICAL_SAMPLE_RATE`]. Anything else a caller uploads is
//! decoded and re-encoded here. The input artifact is never touched;
//! conversion writes a new artifact into a scratch path supplied (and
//! owned) by the calling job.

use std::path::Path;

use crate::audio::{writer, ArtifactFormat, AudioArtifact, AudioLoader};
use crate::core::ConversionError;
use crate::CANONICAL_SAMPLE_RATE;

/// Converts arbitrary input samples into the canonical engine format
#[derive(Debug, Default, Clone, Copy)]
pub struct AudioNormalizer;

impl AudioNormalizer {
    pub fn new() -> Self {
        Self
    }

    /// Check whether an artifact already satisfies the canonical format
    /// by inspecting its WAV header only.
    pub fn is_canonical(&self, artifact: &AudioArtifact) -> bool {
        if artifact.format != ArtifactFormat::Wav {
            return false;
        }
        match AudioLoader::wav_spec(&artifact.path) {
            Ok(spec) => {
                spec.channels == 1
                    && spec.sample_rate == CANONICAL_SAMPLE_RATE
                    && spec.bits_per_sample == 16
                    && spec.sample_format == hound::SampleFormat::Int
            }
            Err(_) => false,
        }
    }

    /// Normalize an artifact into the canonical format.
    ///
    /// Identity when the input is already canonical: the input artifact
    /// is returned unchanged and `scratch_out` is left unwritten. On
    /// conversion, a new artifact is written to `scratch_out`; the
    /// caller's job owns that handle.
    pub fn normalize(
        &self,
        input: &AudioArtifact,
        scratch_out: &Path,
    ) -> Result<AudioArtifact, ConversionError> {
        if self.is_canonical(input) {
            return Ok(input.clone());
        }

        let decoded = AudioLoader::load_resampled(&input.path, CANONICAL_SAMPLE_RATE).map_err(
            |e| ConversionError::UnsupportedCodec {
                message: format!("{:#}", e),
            },
        )?;

        writer::write_wav(&decoded.samples, CANONICAL_SAMPLE_RATE, scratch_out).map_err(|e| {
            ConversionError::IoFailure {
                message: format!("{:#}", e),
            }
        })?;

        Ok(AudioArtifact::new(scratch_out, ArtifactFormat::Wav)
            .with_sample_rate(CANONICAL_SAMPLE_RATE)
            .with_duration(decoded.duration_secs()))
    }
}
