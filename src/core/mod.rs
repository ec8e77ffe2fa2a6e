//! Core framework: error taxonomy shared by every pipeline stage

pub mod error;

pub use error::{
    BindError, CleanupError, ConversionError, PipelineError, PipelineStage, StageError,
    SynthesisError, UploadError, ValidationError,
};
