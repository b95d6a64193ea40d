//! S3 artifact storage.

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use mediagen_core::types::JobId;

use crate::{artifact_name, content_type, BlobStore, BlobStoreError, StoredArtifact};

/// Key prefix for every artifact object.
const KEY_PREFIX: &str = "media";

/// Stores artifacts as objects under `media/` in one bucket.
///
/// Locators have the form `s3://{bucket}/{key}`.
pub struct S3BlobStore {
    client: S3Client,
    bucket: String,
    region: String,
}

impl S3BlobStore {
    pub fn new(client: S3Client, bucket: String, region: String) -> Self {
        Self {
            client,
            bucket,
            region,
        }
    }

    /// Build a client from the ambient AWS credential chain.
    pub async fn connect(bucket: String, region: String) -> Self {
        let sdk_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(region.clone()))
            .load()
            .await;
        Self::new(S3Client::new(&sdk_config), bucket, region)
    }

    fn public_url(&self, key: &str) -> String {
        format!("https://{}.s3.{}.amazonaws.com/{}", self.bucket, self.region, key)
    }

    /// Split an `s3://bucket/key` locator.
    pub fn parse_locator(locator: &str) -> Option<(&str, &str)> {
        let rest = locator.strip_prefix("s3://")?;
        let (bucket, key) = rest.split_once('/')?;
        if bucket.is_empty() || key.is_empty() {
            return None;
        }
        Some((bucket, key))
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put(
        &self,
        bytes: &[u8],
        job_id: JobId,
        extension: &str,
    ) -> Result<StoredArtifact, BlobStoreError> {
        let key = format!("{KEY_PREFIX}/{}", artifact_name(job_id, extension));

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(bytes.to_vec()))
            .content_type(content_type(extension))
            .send()
            .await
            .map_err(|e| {
                BlobStoreError::Backend(format!(
                    "Failed to upload s3://{}/{}: {}",
                    self.bucket,
                    key,
                    aws_sdk_s3::error::DisplayErrorContext(&e)
                ))
            })?;

        tracing::debug!(job_id = %job_id, bucket = %self.bucket, %key, "Artifact uploaded");

        Ok(StoredArtifact {
            public_url: self.public_url(&key),
            locator: format!("s3://{}/{}", self.bucket, key),
        })
    }

    async fn delete(&self, locator: &str) -> bool {
        let Some((bucket, key)) = Self::parse_locator(locator) else {
            tracing::error!(locator, "{}", BlobStoreError::InvalidLocator(locator.into()));
            return false;
        };

        match self.client.delete_object().bucket(bucket).key(key).send().await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!(
                    locator,
                    error = %aws_sdk_s3::error::DisplayErrorContext(&e),
                    "Failed to delete artifact"
                );
                false
            }
        }
    }
}
