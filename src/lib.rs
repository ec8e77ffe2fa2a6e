//! voxlink — text-to-speech delivery service
//!
//! Accepts text (optionally with a reference voice sample) over HTTP,
//! synthesizes speech through an external engine, transcodes the result
//! to MP3, uploads it to Google Drive, and returns a shareable link.
//!
//! The pipeline is validate -> normalize -> bind voice -> synthesize ->
//! transcode -> upload, with exactly-once scratch cleanup on every exit
//! path and serialized access to the stateful synthesis engine.

pub mod audio;
pub mod config;
pub mod core;
pub mod engine;
pub mod pipeline;
pub mod server;
pub mod storage;
pub mod transcode;
pub mod voice;

pub use config::AppConfig;
pub use core::{PipelineError, PipelineStage};
pub use pipeline::{PipelineOrchestrator, SynthesisRequest};
pub use storage::DeliveryLink;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Sample rate of the canonical engine input format (mono 16-bit PCM)
pub const CANONICAL_SAMPLE_RATE: u32 = 24_000;
