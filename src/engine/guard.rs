//! Serialized, time-bounded engine access
//!
//! The engine is a single stateful instance that must never see two
//! concurrent synthesis calls. All access goes through this guard:
//! a fair (FIFO) async mutex plus a finite timeout around the call
//! itself. The lock is released on every path, including timeout,
//! because the guard holds it only for the lifetime of the awaited
//! call future.

use std::time::Duration;

use tokio::sync::Mutex;
use tracing::warn;

use crate::core::SynthesisError;
use crate::engine::traits::{SynthesisEngine, SynthesisOutput};
use crate::voice::VoiceProfile;

/// Exclusive access wrapper around the synthesis engine
///
/// tokio's `Mutex` queues waiters first-come-first-served, which gives
/// the fairness the pipeline relies on to avoid starvation under load.
pub struct EngineGuard {
    engine: Mutex<Box<dyn SynthesisEngine>>,
    timeout: Duration,
}

impl EngineGuard {
    pub fn new(engine: Box<dyn SynthesisEngine>, timeout: Duration) -> Self {
        Self {
            engine: Mutex::new(engine),
            timeout,
        }
    }

    /// Run one synthesis call under the engine lock, bounded by the
    /// configured timeout. On timeout the call future is dropped and the
    /// lock released; the subprocess adapter kills its child on drop, so
    /// no engine work leaks past the deadline.
    pub async fn synthesize(
        &self,
        voice: &VoiceProfile,
        text: &str,
    ) -> Result<SynthesisOutput, SynthesisError> {
        let mut engine = self.engine.lock().await;
        match tokio::time::timeout(self.timeout, engine.synthesize(voice, text)).await {
            Ok(result) => result,
            Err(_) => {
                warn!(voice = %voice.id, limit = ?self.timeout, "synthesis timed out");
                Err(SynthesisError::Timeout {
                    limit: self.timeout,
                })
            }
        }
    }
}
