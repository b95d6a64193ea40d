//! Artifact storage for generated media.
//!
//! A [`BlobStore`] persists downloaded bytes under a name derived from the
//! job id and hands back a public URL plus an opaque locator that can later
//! be used to delete the artifact.

pub mod config;
pub mod local;
pub mod memory;
pub mod s3;

use std::sync::Arc;

use async_trait::async_trait;
use mediagen_core::types::JobId;

pub use config::StorageConfig;
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use s3::S3BlobStore;

/// Where a stored artifact lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredArtifact {
    /// URL clients use to fetch the artifact.
    pub public_url: String,
    /// Backend-specific reference used for deletion.
    pub locator: String,
}

/// Errors raised by a [`BlobStore`].
#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The remote backend rejected or failed the operation.
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Invalid storage locator: {0}")]
    InvalidLocator(String),
}

/// Durable artifact storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` as `{job_id}.{extension}`.
    async fn put(
        &self,
        bytes: &[u8],
        job_id: JobId,
        extension: &str,
    ) -> Result<StoredArtifact, BlobStoreError>;

    /// Remove a previously stored artifact. Returns `false` on failure;
    /// never raises.
    async fn delete(&self, locator: &str) -> bool;
}

/// File name for a job's artifact.
pub fn artifact_name(job_id: JobId, extension: &str) -> String {
    format!("{job_id}.{extension}")
}

/// MIME type for a known media extension.
pub fn content_type(extension: &str) -> &'static str {
    match extension {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

/// Build the blob store selected by `config`.
pub async fn build_blob_store(config: &StorageConfig) -> Result<Arc<dyn BlobStore>, BlobStoreError> {
    match config {
        StorageConfig::Local { root, url_prefix } => {
            tracing::info!(root = %root.display(), "Using local artifact storage");
            let store = LocalBlobStore::new(root.clone(), url_prefix.clone());
            store.ensure_root().await?;
            Ok(Arc::new(store))
        }
        StorageConfig::S3 { bucket, region } => {
            tracing::info!(%bucket, %region, "Using S3 artifact storage");
            Ok(Arc::new(S3BlobStore::connect(bucket.clone(), region.clone()).await))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn artifact_name_uses_job_id() {
        let id = uuid::Uuid::nil();
        assert_eq!(
            artifact_name(id, "png"),
            "00000000-0000-0000-0000-000000000000.png"
        );
    }

    #[test]
    fn content_types() {
        assert_eq!(content_type("jpg"), "image/jpeg");
        assert_eq!(content_type("mp4"), "video/mp4");
        assert_eq!(content_type("xyz"), "application/octet-stream");
    }
}
