//! voxlink server binary

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use voxlink::audio::{ArtifactFormat, AudioArtifact, AudioNormalizer};
use voxlink::config::AppConfig;
use voxlink::engine::{EngineGuard, SubprocessEngine};
use voxlink::pipeline::PipelineOrchestrator;
use voxlink::server::Server;
use voxlink::storage::{GoogleDriveStorage, ServiceAccountKey};
use voxlink::transcode::{DeliveryFormat, FfmpegTranscoder};
use voxlink::voice::{FileVoiceCloner, VoiceBinder};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::parse();
    info!(version = voxlink::VERSION, "starting voxlink");

    // Credential resolution is fatal before anything binds.
    let key = ServiceAccountKey::from_base64(&config.drive_credentials_b64)
        .context("invalid VOXLINK_DRIVE_CREDENTIALS_B64")?;
    let storage = Arc::new(GoogleDriveStorage::new(key, config.drive_folder.clone()));

    tokio::fs::create_dir_all(&config.scratch_dir)
        .await
        .with_context(|| format!("cannot create scratch dir {}", config.scratch_dir.display()))?;

    let engine = Box::new(SubprocessEngine::new(
        &config.engine_cmd,
        config.engine_args.clone(),
        &config.scratch_dir,
    ));
    let guard = Arc::new(EngineGuard::new(engine, config.engine_timeout()));

    let cloner = Arc::new(FileVoiceCloner::new(&config.voices_dir));
    let binder = Arc::new(VoiceBinder::new(cloner));

    // The default voice is cloned once at startup so requests with no
    // voice source have a profile to fall back on.
    if let Some(sample_path) = &config.default_voice {
        match bootstrap_default_voice(&binder, sample_path, &config.scratch_dir).await {
            Ok(id) => info!(voice = %id, "default voice ready"),
            Err(e) => warn!(error = %format!("{:#}", e), "default voice bootstrap failed, requests must supply a voice"),
        }
    }

    let transcoder = Arc::new(FfmpegTranscoder::new(&config.ffmpeg_path));

    let orchestrator = PipelineOrchestrator::new(
        &config.scratch_dir,
        DeliveryFormat::Mp3,
        binder,
        guard,
        transcoder,
        storage,
    );

    Server::new(config.bind_addr(), orchestrator).run().await
}

/// Normalize and clone the configured default voice sample, then install
/// the resulting profile as the binder's fallback.
async fn bootstrap_default_voice(
    binder: &VoiceBinder,
    sample_path: &std::path::Path,
    scratch_dir: &std::path::Path,
) -> anyhow::Result<String> {
    let format = match sample_path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("mp3") => ArtifactFormat::Mp3,
        Some(ext) if ext.eq_ignore_ascii_case("flac") => ArtifactFormat::Flac,
        Some(ext) if ext.eq_ignore_ascii_case("ogg") => ArtifactFormat::Ogg,
        _ => ArtifactFormat::Wav,
    };
    let raw = AudioArtifact::new(sample_path, format);

    let scratch_out = scratch_dir.join("default_voice.wav");
    let normalized = {
        let raw = raw.clone();
        let scratch_out = scratch_out.clone();
        tokio::task::spawn_blocking(move || AudioNormalizer::new().normalize(&raw, &scratch_out))
            .await
            .context("normalize task panicked")?
            .context("default voice sample could not be normalized")?
    };

    let profile = binder
        .bind(Some(&normalized), None)
        .await
        .context("default voice cloning failed")?;
    let id = profile.id.clone();
    binder.set_default_profile(profile);

    // The normalized copy has been installed by the cloner; the scratch
    // copy is no longer needed.
    if scratch_out.exists() {
        let _ = tokio::fs::remove_file(&scratch_out).await;
    }
    Ok(id)
}
