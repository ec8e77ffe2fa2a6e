//! Engine trait boundary

use async_trait::async_trait;

use crate::core::SynthesisError;
use crate::voice::VoiceProfile;

/// Raw waveform produced by one synthesis call
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    /// Mono samples normalized to [-1, 1]
    pub samples: Vec<f32>,
    /// Sample rate of the waveform
    pub sample_rate: u32,
}

impl SynthesisOutput {
    /// Duration in seconds
    pub fn duration_secs(&self) -> f32 {
        self.samples.len() as f32 / self.sample_rate as f32
    }
}

/// A speech synthesis engine: (voice profile, text) -> waveform
///
/// Takes `&mut self` because engines hold mutable inference state and
/// are not re-entrant; all access goes through [`super::EngineGuard`],
/// which serializes callers.
#[async_trait]
pub trait SynthesisEngine: Send + Sync {
    async fn synthesize(
        &mut self,
        voice: &VoiceProfile,
        text: &str,
    ) -> Result<SynthesisOutput, SynthesisError>;
}
