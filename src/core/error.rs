//! Structured error handling for the synthesis pipeline
//!
//! Every pipeline stage has its own error enum; a failure anywhere is
//! wrapped into [`PipelineError`] carrying the stage it happened in.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Result type alias with PipelineError
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Validation,
    Normalization,
    VoiceBinding,
    Synthesis,
    Transcoding,
    Upload,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineStage::Validation => write!(f, "validation"),
            PipelineStage::Normalization => write!(f, "normalization"),
            PipelineStage::VoiceBinding => write!(f, "voice binding"),
            PipelineStage::Synthesis => write!(f, "synthesis"),
            PipelineStage::Transcoding => write!(f, "transcoding"),
            PipelineStage::Upload => write!(f, "upload"),
        }
    }
}

/// Caller-input errors, surfaced as 4xx and never retried
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Request carried no text
    #[error("Missing text")]
    MissingText,

    /// Supplied voice sample is not recognizable audio
    #[error("Audio sample could not be read")]
    UnreadableAudio,
}

/// Audio decode/encode errors
#[derive(Error, Debug)]
pub enum ConversionError {
    /// Source container cannot be decoded
    #[error("unsupported audio codec: {message}")]
    UnsupportedCodec { message: String },

    /// Read or write failure on an artifact
    #[error("audio i/o failure: {message}")]
    IoFailure { message: String },

    /// Target encoder failed
    #[error("audio encode failure: {message}")]
    EncodeFailure { message: String },
}

/// Voice resolution / cloning errors
#[derive(Error, Debug)]
pub enum BindError {
    /// The cloning primitive errored or timed out
    #[error("voice cloning failed: {message}")]
    CloningFailed { message: String },

    /// Neither a sample nor a profile id was supplied and no default
    /// profile is configured
    #[error("no voice source supplied and no default profile configured")]
    NoVoiceSource,

    /// Both a sample and an explicit profile id were supplied
    #[error("voice sample and explicit profile id are mutually exclusive")]
    AmbiguousVoiceSource,
}

/// Engine failure or timeout
///
/// Timeout is a distinct variant so callers can decide whether a retry
/// makes sense.
#[derive(Error, Debug)]
pub enum SynthesisError {
    /// The synthesis call exceeded the configured limit
    #[error("synthesis timed out after {limit:?}")]
    Timeout { limit: Duration },

    /// The engine reported a hard failure
    #[error("synthesis engine failed: {message}")]
    EngineFailed { message: String },

    /// The engine produced output the pipeline cannot use
    #[error("synthesis produced invalid output: {message}")]
    InvalidOutput { message: String },
}

/// Remote storage errors
#[derive(Error, Debug)]
pub enum UploadError {
    /// Credential resolution or token exchange failed
    #[error("storage credential error: {message}")]
    Credential { message: String },

    /// The upload call itself failed
    #[error("upload transfer failed: {message}")]
    TransferFailed { message: String },

    /// Upload succeeded but the permission grant did not; the remote
    /// object may exist but be unreadable. The object id is kept so an
    /// operator can find the orphan.
    #[error("permission grant failed for uploaded object {object_id}: {message}")]
    PermissionGrantFailed { object_id: String, message: String },
}

/// Scratch release failure. Logged, never surfaced to callers.
#[derive(Error, Debug)]
#[error("failed to release {path}: {message}")]
pub struct CleanupError {
    pub path: String,
    pub message: String,
}

/// Union of the per-stage error types
#[derive(Error, Debug)]
pub enum StageError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    #[error(transparent)]
    Bind(#[from] BindError),
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error(transparent)]
    Upload(#[from] UploadError),
}

/// A stage failure, tagged with the stage it happened in
#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    #[source]
    pub source: StageError,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, source: impl Into<StageError>) -> Self {
        Self {
            stage,
            source: source.into(),
        }
    }

    /// True when the failure is the caller's fault (maps to 4xx)
    pub fn is_client_error(&self) -> bool {
        matches!(self.source, StageError::Validation(_))
    }

    /// Message safe to return to the caller. Validation failures carry
    /// their own wording; everything else is reported as-is, with the
    /// stage tag left to the logs.
    pub fn public_message(&self) -> String {
        match &self.source {
            StageError::Validation(e) => e.to_string(),
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_text_wording() {
        // Exact wording is part of the HTTP contract
        assert_eq!(ValidationError::MissingText.to_string(), "Missing text");
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(PipelineStage::VoiceBinding.to_string(), "voice binding");
        assert_eq!(PipelineStage::Upload.to_string(), "upload");
    }

    #[test]
    fn test_pipeline_error_tags_stage() {
        let err = PipelineError::new(
            PipelineStage::Synthesis,
            SynthesisError::Timeout {
                limit: Duration::from_secs(30),
            },
        );
        assert_eq!(err.stage, PipelineStage::Synthesis);
        assert!(err.to_string().contains("synthesis stage failed"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_validation_is_client_error() {
        let err = PipelineError::new(PipelineStage::Validation, ValidationError::MissingText);
        assert!(err.is_client_error());
        assert_eq!(err.public_message(), "Missing text");
    }

    #[test]
    fn test_permission_grant_keeps_object_id() {
        let err = UploadError::PermissionGrantFailed {
            object_id: "abc123".to_string(),
            message: "403".to_string(),
        };
        assert!(err.to_string().contains("abc123"));
    }
}
