//! Pipeline orchestration
//!
//! The single implementation of the request flow. Every stage failure
//! marks the job failed (releasing scratch) and surfaces a
//! [`PipelineError`] tagged with the stage; the successful path releases
//! scratch on completion. CPU-bound audio work runs on the blocking
//! pool so the request executor stays responsive.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, instrument};

use crate::audio::{writer, ArtifactFormat, AudioArtifact, AudioLoader, AudioNormalizer};
use crate::core::{ConversionError, PipelineError, PipelineStage, ValidationError};
use crate::engine::EngineGuard;
use crate::pipeline::{JobState, PipelineJob, SynthesisRequest};
use crate::storage::{DeliveryLink, StorageBackend};
use crate::transcode::{DeliveryFormat, Transcoder};
use crate::voice::VoiceBinder;

pub struct PipelineOrchestrator {
    scratch_root: PathBuf,
    delivery_format: DeliveryFormat,
    normalizer: AudioNormalizer,
    binder: Arc<VoiceBinder>,
    engine: Arc<EngineGuard>,
    transcoder: Arc<dyn Transcoder>,
    storage: Arc<dyn StorageBackend>,
}

impl PipelineOrchestrator {
    pub fn new(
        scratch_root: impl Into<PathBuf>,
        delivery_format: DeliveryFormat,
        binder: Arc<VoiceBinder>,
        engine: Arc<EngineGuard>,
        transcoder: Arc<dyn Transcoder>,
        storage: Arc<dyn StorageBackend>,
    ) -> Self {
        Self {
            scratch_root: scratch_root.into(),
            delivery_format,
            normalizer: AudioNormalizer::new(),
            binder,
            engine,
            transcoder,
            storage,
        }
    }

    pub fn binder(&self) -> &Arc<VoiceBinder> {
        &self.binder
    }

    /// Run one request through the full pipeline.
    #[instrument(skip_all, fields(job))]
    pub async fn run(&self, request: SynthesisRequest) -> Result<DeliveryLink, PipelineError> {
        let mut job = PipelineJob::new(&self.scratch_root).map_err(|e| {
            PipelineError::new(
                PipelineStage::Validation,
                ConversionError::IoFailure {
                    message: format!("failed to admit job: {}", e),
                },
            )
        })?;
        tracing::Span::current().record("job", job.id());

        match self.drive(&mut job, request).await {
            Ok(link) => {
                job.complete();
                Ok(link)
            }
            Err(err) => {
                job.fail(err.stage);
                Err(err)
            }
        }
    }

    async fn drive(
        &self,
        job: &mut PipelineJob,
        request: SynthesisRequest,
    ) -> Result<DeliveryLink, PipelineError> {
        // Validation: text is mandatory; a supplied sample must at least
        // look like audio before any expensive work happens.
        let text = request.text.trim().to_string();
        if text.is_empty() {
            return Err(PipelineError::new(
                PipelineStage::Validation,
                ValidationError::MissingText,
            ));
        }
        let sample_format = match &request.voice_sample {
            Some(bytes) => match AudioLoader::sniff_container(bytes) {
                Some(format) => Some(format),
                None => {
                    return Err(PipelineError::new(
                        PipelineStage::Validation,
                        ValidationError::UnreadableAudio,
                    ))
                }
            },
            None => None,
        };
        job.advance(JobState::Validated);

        // Normalization: materialize the sample bytes, then convert to
        // the canonical engine format off the async executor.
        let normalized_sample = match (request.voice_sample, sample_format) {
            (Some(bytes), Some(format)) => {
                let raw_path = job.janitor().scratch_path(format.extension());
                tokio::fs::write(&raw_path, &bytes).await.map_err(|e| {
                    PipelineError::new(
                        PipelineStage::Normalization,
                        ConversionError::IoFailure {
                            message: format!("failed to write sample: {}", e),
                        },
                    )
                })?;
                let raw = AudioArtifact::new(raw_path, format);
                let scratch_out = job.janitor().scratch_path("wav");

                let normalizer = self.normalizer;
                let normalized =
                    tokio::task::spawn_blocking(move || normalizer.normalize(&raw, &scratch_out))
                        .await
                        .map_err(|e| {
                            PipelineError::new(
                                PipelineStage::Normalization,
                                ConversionError::IoFailure {
                                    message: format!("normalize task panicked: {}", e),
                                },
                            )
                        })?
                        .map_err(|e| PipelineError::new(PipelineStage::Normalization, e))?;
                job.advance(JobState::Normalized);
                Some(normalized)
            }
            _ => None,
        };

        // Voice binding: cached clone, fresh clone, explicit id, or the
        // default profile.
        let profile = self
            .binder
            .bind(normalized_sample.as_ref(), request.profile_id.as_deref())
            .await
            .map_err(|e| PipelineError::new(PipelineStage::VoiceBinding, e))?;
        job.advance(JobState::VoiceBound);

        // Synthesis, serialized through the engine guard.
        let waveform = self
            .engine
            .synthesize(&profile, &text)
            .await
            .map_err(|e| PipelineError::new(PipelineStage::Synthesis, e))?;
        let duration = waveform.duration_secs();

        let raw_out = job.janitor().scratch_path("wav");
        let raw_artifact = {
            let raw_out_for_write = raw_out.clone();
            let sample_rate = waveform.sample_rate;
            tokio::task::spawn_blocking(move || {
                writer::write_wav(&waveform.samples, sample_rate, &raw_out_for_write)
            })
            .await
            .map_err(|e| {
                PipelineError::new(
                    PipelineStage::Synthesis,
                    ConversionError::IoFailure {
                        message: format!("artifact write task panicked: {}", e),
                    },
                )
            })?
            .map_err(|e| {
                PipelineError::new(
                    PipelineStage::Synthesis,
                    ConversionError::IoFailure {
                        message: format!("{:#}", e),
                    },
                )
            })?;
            AudioArtifact::new(raw_out, ArtifactFormat::Wav)
                .with_sample_rate(sample_rate)
                .with_duration(duration)
        };
        job.advance(JobState::Synthesized);

        // Transcode to the delivery format.
        let delivery_out = job
            .janitor()
            .scratch_path(self.delivery_format.artifact_format().extension());
        let delivery = self
            .transcoder
            .transcode(&raw_artifact, self.delivery_format, &delivery_out)
            .await
            .map_err(|e| PipelineError::new(PipelineStage::Transcoding, e))?;
        job.advance(JobState::Transcoded);

        // Upload and share.
        let name = display_name(job.id(), self.delivery_format);
        let link = self
            .storage
            .upload(&delivery, &name)
            .await
            .map_err(|e| PipelineError::new(PipelineStage::Upload, e))?;
        job.advance(JobState::Uploaded);

        info!(
            job = %job.id(),
            voice = %profile.id,
            duration_secs = duration,
            url = %link.url,
            "synthesis delivered"
        );
        Ok(link)
    }
}

/// Remote display name for a delivered artifact. Timestamped so repeat
/// requests never collide; the job id suffix disambiguates within a
/// second.
fn display_name(job_id: &str, format: DeliveryFormat) -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let short_id = &job_id[..8.min(job_id.len())];
    format!(
        "voxlink_{}_{}.{}",
        stamp,
        short_id,
        format.artifact_format().extension()
    )
}
