//! End-to-end pipeline tests with mock collaborators
//!
//! The engine, cloner, transcoder, and storage backend are swapped for
//! in-memory mocks at their trait seams; the normalizer, job state
//! machine, and janitor run for real against scratch directories.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use voxlink::audio::{writer, AudioArtifact};
use voxlink::core::{PipelineStage, SynthesisError, UploadError};
use voxlink::engine::{EngineGuard, SynthesisEngine, SynthesisOutput};
use voxlink::pipeline::{PipelineOrchestrator, SynthesisRequest};
use voxlink::storage::{DeliveryLink, StorageBackend};
use voxlink::transcode::{DeliveryFormat, Transcoder};
use voxlink::voice::{VoiceBinder, VoiceCloner, VoiceProfile};
use voxlink::CANONICAL_SAMPLE_RATE;

// ---- mocks -------------------------------------------------------------

/// Engine that records the wall-clock window of every invocation
struct WindowedEngine {
    windows: Arc<Mutex<Vec<(Instant, Instant)>>>,
    calls: Arc<AtomicUsize>,
    delay: Duration,
}

#[async_trait]
impl SynthesisEngine for WindowedEngine {
    async fn synthesize(
        &mut self,
        _voice: &VoiceProfile,
        _text: &str,
    ) -> Result<SynthesisOutput, SynthesisError> {
        let start = Instant::now();
        tokio::time::sleep(self.delay).await;
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.windows.lock().unwrap().push((start, Instant::now()));
        Ok(SynthesisOutput {
            samples: vec![0.1; 2400],
            sample_rate: CANONICAL_SAMPLE_RATE,
        })
    }
}

struct FailingEngine;

#[async_trait]
impl SynthesisEngine for FailingEngine {
    async fn synthesize(
        &mut self,
        _voice: &VoiceProfile,
        _text: &str,
    ) -> Result<SynthesisOutput, SynthesisError> {
        Err(SynthesisError::EngineFailed {
            message: "mock engine down".to_string(),
        })
    }
}

struct CountingCloner {
    calls: AtomicUsize,
}

#[async_trait]
impl VoiceCloner for CountingCloner {
    async fn clone_voice(&self, _sample: &AudioArtifact) -> anyhow::Result<VoiceProfile> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(VoiceProfile::registered(format!("cloned-{}", n)))
    }
}

/// Transcoder that copies the artifact into place
struct CopyTranscoder;

#[async_trait]
impl Transcoder for CopyTranscoder {
    async fn transcode(
        &self,
        input: &AudioArtifact,
        target: DeliveryFormat,
        out_path: &Path,
    ) -> Result<AudioArtifact, voxlink::core::ConversionError> {
        tokio::fs::copy(&input.path, out_path).await.map_err(|e| {
            voxlink::core::ConversionError::IoFailure {
                message: e.to_string(),
            }
        })?;
        Ok(AudioArtifact::new(
            out_path.to_path_buf(),
            target.artifact_format(),
        ))
    }
}

struct FailingTranscoder;

#[async_trait]
impl Transcoder for FailingTranscoder {
    async fn transcode(
        &self,
        _input: &AudioArtifact,
        _target: DeliveryFormat,
        _out_path: &Path,
    ) -> Result<AudioArtifact, voxlink::core::ConversionError> {
        Err(voxlink::core::ConversionError::EncodeFailure {
            message: "mock encoder down".to_string(),
        })
    }
}

struct MockStorage {
    uploads: AtomicUsize,
}

#[async_trait]
impl StorageBackend for MockStorage {
    async fn upload(
        &self,
        _artifact: &AudioArtifact,
        display_name: &str,
    ) -> Result<DeliveryLink, UploadError> {
        let n = self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(DeliveryLink {
            url: format!("https://example.test/{}", display_name),
            object_id: format!("obj-{}", n),
        })
    }
}

struct FailingStorage;

#[async_trait]
impl StorageBackend for FailingStorage {
    async fn upload(
        &self,
        _artifact: &AudioArtifact,
        _display_name: &str,
    ) -> Result<DeliveryLink, UploadError> {
        Err(UploadError::TransferFailed {
            message: "mock storage down".to_string(),
        })
    }
}

// ---- harness -----------------------------------------------------------

struct Harness {
    orchestrator: Arc<PipelineOrchestrator>,
    scratch: tempfile::TempDir,
    engine_calls: Arc<AtomicUsize>,
    windows: Arc<Mutex<Vec<(Instant, Instant)>>>,
    cloner: Arc<CountingCloner>,
    storage: Arc<MockStorage>,
}

fn harness() -> Harness {
    harness_with(None, None)
}

fn harness_with(
    engine: Option<Box<dyn SynthesisEngine>>,
    storage_backend: Option<Arc<dyn StorageBackend>>,
) -> Harness {
    let scratch = tempfile::tempdir().unwrap();
    let windows = Arc::new(Mutex::new(Vec::new()));
    let engine_calls = Arc::new(AtomicUsize::new(0));

    let engine = engine.unwrap_or_else(|| {
        Box::new(WindowedEngine {
            windows: windows.clone(),
            calls: engine_calls.clone(),
            delay: Duration::from_millis(10),
        })
    });
    let guard = Arc::new(EngineGuard::new(engine, Duration::from_secs(5)));

    let cloner = Arc::new(CountingCloner {
        calls: AtomicUsize::new(0),
    });
    let binder = Arc::new(VoiceBinder::new(cloner.clone()));
    binder.set_default_profile(VoiceProfile::registered("default"));

    let storage = Arc::new(MockStorage {
        uploads: AtomicUsize::new(0),
    });
    let storage_backend: Arc<dyn StorageBackend> =
        storage_backend.unwrap_or_else(|| storage.clone() as Arc<dyn StorageBackend>);

    let orchestrator = Arc::new(PipelineOrchestrator::new(
        scratch.path(),
        DeliveryFormat::Mp3,
        binder,
        guard,
        Arc::new(CopyTranscoder),
        storage_backend,
    ));

    Harness {
        orchestrator,
        scratch,
        engine_calls,
        windows,
        cloner,
        storage,
    }
}

fn scratch_is_empty(root: &Path) -> bool {
    std::fs::read_dir(root).unwrap().next().is_none()
}

fn text_request(text: &str) -> SynthesisRequest {
    SynthesisRequest {
        text: text.to_string(),
        voice_sample: None,
        profile_id: None,
    }
}

fn canonical_sample_bytes() -> Vec<u8> {
    let samples: Vec<f32> = (0..CANONICAL_SAMPLE_RATE / 2)
        .map(|i| (i as f32 / 100.0).sin() * 0.3)
        .collect();
    writer::encode_wav(&samples, CANONICAL_SAMPLE_RATE).unwrap()
}

// ---- tests -------------------------------------------------------------

#[tokio::test]
async fn success_path_delivers_link_and_cleans_scratch() {
    let h = harness();
    let link = h.orchestrator.run(text_request("Hello world")).await.unwrap();

    assert!(link.url.starts_with("https://example.test/voxlink_"));
    assert!(link.url.ends_with(".mp3"));
    assert_eq!(h.engine_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.storage.uploads.load(Ordering::SeqCst), 1);
    assert!(scratch_is_empty(h.scratch.path()));
}

#[tokio::test]
async fn missing_text_short_circuits_before_any_work() {
    let h = harness();
    let err = h.orchestrator.run(text_request("   ")).await.unwrap_err();

    assert_eq!(err.stage, PipelineStage::Validation);
    assert!(err.is_client_error());
    assert_eq!(err.public_message(), "Missing text");
    assert_eq!(h.engine_calls.load(Ordering::SeqCst), 0);
    assert_eq!(h.storage.uploads.load(Ordering::SeqCst), 0);
    assert!(scratch_is_empty(h.scratch.path()));
}

#[tokio::test]
async fn unreadable_sample_is_rejected_at_validation() {
    let h = harness();
    let request = SynthesisRequest {
        text: "Hello".to_string(),
        voice_sample: Some(b"definitely not audio bytes".to_vec()),
        profile_id: None,
    };
    let err = h.orchestrator.run(request).await.unwrap_err();

    assert_eq!(err.stage, PipelineStage::Validation);
    assert!(err.is_client_error());
    assert_eq!(h.engine_calls.load(Ordering::SeqCst), 0);
    assert!(scratch_is_empty(h.scratch.path()));
}

#[tokio::test]
async fn concurrent_requests_never_overlap_in_the_engine() {
    let h = harness();
    let mut tasks = Vec::new();
    for i in 0..4 {
        let orchestrator = h.orchestrator.clone();
        tasks.push(tokio::spawn(async move {
            orchestrator.run(text_request(&format!("request {}", i))).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let windows = h.windows.lock().unwrap();
    assert_eq!(windows.len(), 4);
    for (i, a) in windows.iter().enumerate() {
        for b in windows.iter().skip(i + 1) {
            let disjoint = a.1 <= b.0 || b.1 <= a.0;
            assert!(disjoint, "engine invocations overlapped: {:?} vs {:?}", a, b);
        }
    }
    assert!(scratch_is_empty(h.scratch.path()));
}

#[tokio::test]
async fn synthesis_failure_is_tagged_and_scratch_cleaned() {
    let h = harness_with(Some(Box::new(FailingEngine)), None);
    let err = h.orchestrator.run(text_request("Hello")).await.unwrap_err();

    assert_eq!(err.stage, PipelineStage::Synthesis);
    assert!(!err.is_client_error());
    assert_eq!(h.storage.uploads.load(Ordering::SeqCst), 0);
    assert!(scratch_is_empty(h.scratch.path()));
}

#[tokio::test]
async fn transcode_failure_is_tagged_and_scratch_cleaned() {
    let scratch = tempfile::tempdir().unwrap();
    let guard = Arc::new(EngineGuard::new(
        Box::new(WindowedEngine {
            windows: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(AtomicUsize::new(0)),
            delay: Duration::from_millis(1),
        }),
        Duration::from_secs(5),
    ));
    let binder = Arc::new(VoiceBinder::new(Arc::new(CountingCloner {
        calls: AtomicUsize::new(0),
    })));
    binder.set_default_profile(VoiceProfile::registered("default"));

    let orchestrator = PipelineOrchestrator::new(
        scratch.path(),
        DeliveryFormat::Mp3,
        binder,
        guard,
        Arc::new(FailingTranscoder),
        Arc::new(MockStorage {
            uploads: AtomicUsize::new(0),
        }),
    );

    let err = orchestrator.run(text_request("Hello")).await.unwrap_err();
    assert_eq!(err.stage, PipelineStage::Transcoding);
    assert!(scratch_is_empty(scratch.path()));
}

#[tokio::test]
async fn upload_failure_is_tagged_and_scratch_cleaned() {
    let h = harness_with(None, Some(Arc::new(FailingStorage)));
    let err = h.orchestrator.run(text_request("Hello")).await.unwrap_err();

    assert_eq!(err.stage, PipelineStage::Upload);
    assert!(scratch_is_empty(h.scratch.path()));
}

#[tokio::test]
async fn no_voice_source_without_default_fails_at_binding() {
    let scratch = tempfile::tempdir().unwrap();
    let guard = Arc::new(EngineGuard::new(
        Box::new(FailingEngine),
        Duration::from_secs(5),
    ));
    // No default profile installed.
    let binder = Arc::new(VoiceBinder::new(Arc::new(CountingCloner {
        calls: AtomicUsize::new(0),
    })));

    let orchestrator = PipelineOrchestrator::new(
        scratch.path(),
        DeliveryFormat::Mp3,
        binder,
        guard,
        Arc::new(CopyTranscoder),
        Arc::new(MockStorage {
            uploads: AtomicUsize::new(0),
        }),
    );

    let err = orchestrator.run(text_request("Hello")).await.unwrap_err();
    assert_eq!(err.stage, PipelineStage::VoiceBinding);
    assert!(scratch_is_empty(scratch.path()));
}

#[tokio::test]
async fn repeated_sample_clones_once() {
    let h = harness();
    let bytes = canonical_sample_bytes();

    for _ in 0..3 {
        let request = SynthesisRequest {
            text: "Same voice every time".to_string(),
            voice_sample: Some(bytes.clone()),
            profile_id: None,
        };
        h.orchestrator.run(request).await.unwrap();
    }

    assert_eq!(h.cloner.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.engine_calls.load(Ordering::SeqCst), 3);
    assert!(scratch_is_empty(h.scratch.path()));
}

#[tokio::test]
async fn engine_timeout_surfaces_and_lock_recovers() {
    struct FlakyEngine {
        first: bool,
    }

    #[async_trait]
    impl SynthesisEngine for FlakyEngine {
        async fn synthesize(
            &mut self,
            _voice: &VoiceProfile,
            _text: &str,
        ) -> Result<SynthesisOutput, SynthesisError> {
            if self.first {
                self.first = false;
                tokio::time::sleep(Duration::from_secs(30)).await;
            }
            Ok(SynthesisOutput {
                samples: vec![0.1; 2400],
                sample_rate: CANONICAL_SAMPLE_RATE,
            })
        }
    }

    let scratch = tempfile::tempdir().unwrap();
    let guard = Arc::new(EngineGuard::new(
        Box::new(FlakyEngine { first: true }),
        Duration::from_millis(50),
    ));
    let binder = Arc::new(VoiceBinder::new(Arc::new(CountingCloner {
        calls: AtomicUsize::new(0),
    })));
    binder.set_default_profile(VoiceProfile::registered("default"));

    let orchestrator = PipelineOrchestrator::new(
        scratch.path(),
        DeliveryFormat::Mp3,
        binder,
        guard,
        Arc::new(CopyTranscoder),
        Arc::new(MockStorage {
            uploads: AtomicUsize::new(0),
        }),
    );

    let err = orchestrator.run(text_request("slow")).await.unwrap_err();
    assert_eq!(err.stage, PipelineStage::Synthesis);
    assert!(scratch_is_empty(scratch.path()));

    // The guard released the lock; the next request goes through.
    orchestrator.run(text_request("fast")).await.unwrap();
    assert!(scratch_is_empty(scratch.path()));
}
