//! Remote delivery storage

pub mod drive;

pub use drive::{GoogleDriveStorage, ServiceAccountKey};

use async_trait::async_trait;

use crate::audio::AudioArtifact;
use crate::core::UploadError;

/// A shareable reference to an uploaded artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryLink {
    /// Directly downloadable URL, readable without authentication
    pub url: String,
    /// Backend object id, kept for operator triage
    pub object_id: String,
}

/// Uploads a finished artifact and returns a link anyone can fetch
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn upload(
        &self,
        artifact: &AudioArtifact,
        display_name: &str,
    ) -> Result<DeliveryLink, UploadError>;
}
