use std::collections::HashMap;

use async_trait::async_trait;
use mediagen_core::types::JobId;
use tokio::sync::RwLock;

use crate::{artifact_name, BlobStore, BlobStoreError, StoredArtifact};

/// In-process [`BlobStore`] used by tests.
#[derive(Default)]
pub struct MemoryBlobStore {
    objects: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored under `locator`, if any.
    pub async fn get(&self, locator: &str) -> Option<Vec<u8>> {
        self.objects.read().await.get(locator).cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(
        &self,
        bytes: &[u8],
        job_id: JobId,
        extension: &str,
    ) -> Result<StoredArtifact, BlobStoreError> {
        let name = artifact_name(job_id, extension);
        let locator = format!("memory://{name}");
        self.objects
            .write()
            .await
            .insert(locator.clone(), bytes.to_vec());
        Ok(StoredArtifact {
            public_url: format!("/media/{name}"),
            locator,
        })
    }

    async fn delete(&self, locator: &str) -> bool {
        self.objects.write().await.remove(locator).is_some()
    }
}
