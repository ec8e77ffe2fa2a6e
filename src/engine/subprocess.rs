//! Managed-subprocess synthesis engine
//!
//! Drives an external CLI synthesizer. Arguments are passed as discrete
//! argv entries only; nothing is ever interpolated into a shell string,
//! so request text cannot become shell syntax.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::audio::AudioLoader;
use crate::core::SynthesisError;
use crate::engine::traits::{SynthesisEngine, SynthesisOutput};
use crate::voice::VoiceProfile;

/// Engine adapter for a synthesizer invoked as a child process
///
/// One invocation per synthesis call: the child writes a WAV file to a
/// scratch path, and the adapter reads it back as the output waveform.
pub struct SubprocessEngine {
    program: PathBuf,
    base_args: Vec<String>,
    scratch_dir: PathBuf,
}

impl SubprocessEngine {
    pub fn new(
        program: impl Into<PathBuf>,
        base_args: Vec<String>,
        scratch_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            program: program.into(),
            base_args,
            scratch_dir: scratch_dir.into(),
        }
    }
}

#[async_trait]
impl SynthesisEngine for SubprocessEngine {
    async fn synthesize(
        &mut self,
        voice: &VoiceProfile,
        text: &str,
    ) -> Result<SynthesisOutput, SynthesisError> {
        let out_file = tempfile::Builder::new()
            .prefix("synth-")
            .suffix(".wav")
            .tempfile_in(&self.scratch_dir)
            .map_err(|e| SynthesisError::EngineFailed {
                message: format!("failed to create output scratch file: {}", e),
            })?;
        let out_path = out_file.path().to_path_buf();

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .arg("--text")
            .arg(text)
            .arg("--custom-voice")
            .arg(&voice.id)
            .arg("--output")
            .arg(&out_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            // If the call future is dropped (guard timeout, client gone)
            // the child must not keep running.
            .kill_on_drop(true);

        debug!(program = %self.program.display(), voice = %voice.id, "spawning synthesis process");

        let output = cmd.output().await.map_err(|e| SynthesisError::EngineFailed {
            message: format!("failed to spawn {}: {}", self.program.display(), e),
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(status = %output.status, "synthesis process failed");
            return Err(SynthesisError::EngineFailed {
                message: format!(
                    "{} exited with {}: {}",
                    self.program.display(),
                    output.status,
                    stderr.trim()
                ),
            });
        }

        let decoded = tokio::task::spawn_blocking(move || AudioLoader::load(&out_path))
            .await
            .map_err(|e| SynthesisError::EngineFailed {
                message: format!("decode task panicked: {}", e),
            })?
            .map_err(|e| SynthesisError::InvalidOutput {
                message: format!("{:#}", e),
            })?;

        if decoded.samples.is_empty() {
            return Err(SynthesisError::InvalidOutput {
                message: "engine produced an empty waveform".to_string(),
            });
        }

        Ok(SynthesisOutput {
            samples: decoded.samples,
            sample_rate: decoded.sample_rate,
        })
    }
}
