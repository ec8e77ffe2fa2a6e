//! Voice binding and the profile cache
//!
//! Cloning a voice from a reference sample is expensive, so profiles
//! are cached process-wide, keyed by the sample's content fingerprint.
//! The cache is unbounded for the process lifetime; the deployment is
//! low-volume and re-cloning dominates any realistic memory cost.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info};
use uuid::Uuid;

use crate::audio::AudioArtifact;
use crate::core::BindError;
use crate::voice::VoiceProfile;

/// Default bound on a single cloning invocation
const DEFAULT_CLONE_TIMEOUT: Duration = Duration::from_secs(60);

/// The external cloning primitive: derive a usable profile from a
/// normalized reference sample
#[async_trait]
pub trait VoiceCloner: Send + Sync {
    async fn clone_voice(&self, sample: &AudioArtifact) -> anyhow::Result<VoiceProfile>;
}

/// Cloning backend for engines that pick up custom voices from a
/// directory: installs the normalized sample under a fresh id and hands
/// that id to the engine.
pub struct FileVoiceCloner {
    voices_dir: PathBuf,
}

impl FileVoiceCloner {
    pub fn new(voices_dir: impl Into<PathBuf>) -> Self {
        Self {
            voices_dir: voices_dir.into(),
        }
    }
}

#[async_trait]
impl VoiceCloner for FileVoiceCloner {
    async fn clone_voice(&self, sample: &AudioArtifact) -> anyhow::Result<VoiceProfile> {
        tokio::fs::create_dir_all(&self.voices_dir).await?;
        let id = Uuid::new_v4().to_string();
        let installed = self.voices_dir.join(format!("{}.wav", id));
        tokio::fs::copy(&sample.path, &installed).await?;
        debug!(voice = %id, path = %installed.display(), "installed cloned voice");
        Ok(VoiceProfile {
            id,
            source_sample: Some(installed),
        })
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy)]
pub struct BinderStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Resolves a voice profile for a request: cached clone, fresh clone,
/// explicit id, or the process-wide default
pub struct VoiceBinder {
    cloner: Arc<dyn VoiceCloner>,
    clone_timeout: Duration,
    default_profile: RwLock<Option<VoiceProfile>>,
    /// Content fingerprint -> profile; unbounded for process lifetime
    cache: DashMap<u64, VoiceProfile>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl VoiceBinder {
    pub fn new(cloner: Arc<dyn VoiceCloner>) -> Self {
        Self {
            cloner,
            clone_timeout: DEFAULT_CLONE_TIMEOUT,
            default_profile: RwLock::new(None),
            cache: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn with_clone_timeout(mut self, timeout: Duration) -> Self {
        self.clone_timeout = timeout;
        self
    }

    /// Install the profile used when a request names no voice source
    pub fn set_default_profile(&self, profile: VoiceProfile) {
        info!(voice = %profile.id, "default voice profile installed");
        *self.default_profile.write().unwrap() = Some(profile);
    }

    pub fn default_profile(&self) -> Option<VoiceProfile> {
        self.default_profile.read().unwrap().clone()
    }

    /// Resolve a profile. At most one of `sample` / `explicit_id` may be
    /// set; with neither, the configured default profile is used.
    pub async fn bind(
        &self,
        sample: Option<&AudioArtifact>,
        explicit_id: Option<&str>,
    ) -> Result<VoiceProfile, BindError> {
        match (sample, explicit_id) {
            (Some(_), Some(_)) => Err(BindError::AmbiguousVoiceSource),
            (None, Some(id)) => Ok(VoiceProfile::registered(id)),
            (Some(sample), None) => self.bind_sample(sample).await,
            (None, None) => self.default_profile().ok_or(BindError::NoVoiceSource),
        }
    }

    async fn bind_sample(&self, sample: &AudioArtifact) -> Result<VoiceProfile, BindError> {
        let fp = fingerprint(&sample.path).map_err(|e| BindError::CloningFailed {
            message: format!("failed to fingerprint sample: {}", e),
        })?;

        if let Some(cached) = self.cache.get(&fp) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!(voice = %cached.id, fingerprint = fp, "voice cache hit");
            return Ok(cached.clone());
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let profile = tokio::time::timeout(self.clone_timeout, self.cloner.clone_voice(sample))
            .await
            .map_err(|_| BindError::CloningFailed {
                message: format!("cloning timed out after {:?}", self.clone_timeout),
            })?
            .map_err(|e| BindError::CloningFailed {
                message: format!("{:#}", e),
            })?;

        // Replace, never update: a concurrent clone of the same sample
        // simply wins the race with an equivalent profile.
        self.cache.insert(fp, profile.clone());
        Ok(profile)
    }

    pub fn stats(&self) -> BinderStats {
        BinderStats {
            entries: self.cache.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

/// Content fingerprint of a sample file
fn fingerprint(path: &Path) -> std::io::Result<u64> {
    let bytes = std::fs::read(path)?;
    let mut hasher = DefaultHasher::new();
    bytes.hash(&mut hasher);
    Ok(hasher.finish())
}
