//! The synthesis pipeline
//!
//! One request flows validate -> normalize -> bind voice -> synthesize
//! -> transcode -> upload, with scratch cleanup guaranteed on every
//! exit. Transport adapters construct a [`SynthesisRequest`] and hand
//! it to the orchestrator; everything past the transport boundary is
//! transport-agnostic.

pub mod janitor;
pub mod job;
pub mod orchestrator;

pub use janitor::TempResourceJanitor;
pub use job::{JobState, PipelineJob};
pub use orchestrator::PipelineOrchestrator;

/// A transport-agnostic synthesis request
///
/// At most one of `voice_sample` / `profile_id` may be set; neither
/// falls back to the configured default voice.
#[derive(Debug, Clone, Default)]
pub struct SynthesisRequest {
    /// Text to speak
    pub text: String,
    /// Raw bytes of an uploaded reference sample, if any
    pub voice_sample: Option<Vec<u8>>,
    /// Pre-registered voice profile id, if any
    pub profile_id: Option<String>,
}
