use std::path::PathBuf;

/// Artifact storage backend selection.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// Files on local disk, served under `url_prefix`.
    Local { root: PathBuf, url_prefix: String },
    /// Objects in an S3 bucket.
    S3 { bucket: String, region: String },
}

impl StorageConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var              | Default           |
    /// |----------------------|-------------------|
    /// | `STORAGE_TYPE`       | `local`           |
    /// | `LOCAL_STORAGE_PATH` | `./storage/media` |
    /// | `MEDIA_URL_PREFIX`   | `/media`          |
    /// | `S3_BUCKET_NAME`     | (required for s3) |
    /// | `AWS_REGION`         | `us-east-1`       |
    pub fn from_env() -> Self {
        let kind = std::env::var("STORAGE_TYPE").unwrap_or_else(|_| "local".into());

        match kind.trim().to_ascii_lowercase().as_str() {
            "s3" => {
                let bucket = std::env::var("S3_BUCKET_NAME")
                    .expect("S3_BUCKET_NAME must be set when STORAGE_TYPE=s3");
                let region = std::env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".into());
                Self::S3 { bucket, region }
            }
            "local" => {
                let root = std::env::var("LOCAL_STORAGE_PATH")
                    .unwrap_or_else(|_| "./storage/media".into());
                let url_prefix =
                    std::env::var("MEDIA_URL_PREFIX").unwrap_or_else(|_| "/media".into());
                Self::Local {
                    root: PathBuf::from(root),
                    url_prefix: url_prefix.trim_end_matches('/').to_string(),
                }
            }
            other => panic!("STORAGE_TYPE must be 'local' or 's3', got '{other}'"),
        }
    }
}
