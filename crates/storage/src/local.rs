use std::path::{Path, PathBuf};

use async_trait::async_trait;
use mediagen_core::types::JobId;

use crate::{artifact_name, BlobStore, BlobStoreError, StoredArtifact};

/// Stores artifacts as files in a single directory.
///
/// The locator is the absolute-or-relative file path; the public URL is
/// `{url_prefix}/{file_name}`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    url_prefix: String,
}

impl LocalBlobStore {
    pub fn new(root: PathBuf, url_prefix: String) -> Self {
        Self { root, url_prefix }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the storage directory if missing.
    pub async fn ensure_root(&self) -> Result<(), BlobStoreError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(
        &self,
        bytes: &[u8],
        job_id: JobId,
        extension: &str,
    ) -> Result<StoredArtifact, BlobStoreError> {
        self.ensure_root().await?;

        let file_name = artifact_name(job_id, extension);
        let path = self.root.join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        tracing::debug!(job_id = %job_id, path = %path.display(), "Artifact written");

        Ok(StoredArtifact {
            public_url: format!("{}/{}", self.url_prefix, file_name),
            locator: path.to_string_lossy().into_owned(),
        })
    }

    async fn delete(&self, locator: &str) -> bool {
        match tokio::fs::remove_file(locator).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => true,
            Err(e) => {
                tracing::error!(locator, error = %e, "Failed to delete artifact");
                false
            }
        }
    }
}
