//! Voice profiles and voice binding

pub mod binder;

pub use binder::{BinderStats, FileVoiceCloner, VoiceBinder, VoiceCloner};

use std::path::PathBuf;

/// An opaque handle to a speaker identity usable by the synthesis engine
///
/// Either derived from a reference sample (cloning) or pre-registered
/// under a caller-supplied id. Never mutated after creation; re-cloning
/// the same sample replaces the profile rather than updating it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceProfile {
    /// Derived fingerprint id or caller-supplied id
    pub id: String,
    /// Normalized reference sample the profile was cloned from, if any
    pub source_sample: Option<PathBuf>,
}

impl VoiceProfile {
    /// A pre-registered profile known to the engine by id
    pub fn registered(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source_sample: None,
        }
    }
}
