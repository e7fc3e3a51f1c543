//! S3-backed staging of Core-bound uploads.

use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{Duration, Utc};
use std::time::Duration as StdDuration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use goftar_core::{defaults, Error, Result, StagedFile};

/// Configuration for the object stager.
#[derive(Debug, Clone)]
pub struct StagerConfig {
    /// Bucket holding the staging namespace.
    pub bucket: String,
    /// Key prefix of the temporary namespace.
    pub prefix: String,
    /// Endpoint override for S3-compatible stores (MinIO and friends).
    pub endpoint_url: Option<String>,
    /// Region; ignored by most S3-compatible stores but required by the SDK.
    pub region: String,
    /// Retention window applied at upload time.
    pub retention_hours: i64,
    /// Default presigned-URL lifetime in seconds.
    pub presign_ttl_secs: u64,
}

impl Default for StagerConfig {
    fn default() -> Self {
        Self {
            bucket: "goftar-staging".to_string(),
            prefix: defaults::STAGING_PREFIX.to_string(),
            endpoint_url: None,
            region: "us-east-1".to_string(),
            retention_hours: defaults::STAGED_RETENTION_HOURS,
            presign_ttl_secs: defaults::PRESIGN_TTL_SECS,
        }
    }
}

impl StagerConfig {
    /// Create a config for the given bucket with defaults.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Set the endpoint URL override.
    #[must_use]
    pub fn with_endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    /// Set the staging key prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Create from environment variables (with defaults).
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `STAGING_BUCKET` | `goftar-staging` | Bucket name |
    /// | `STAGING_PREFIX` | `staging/` | Namespace prefix |
    /// | `STAGING_ENDPOINT_URL` | — | S3-compatible endpoint override |
    /// | `STAGING_REGION` | `us-east-1` | SDK region |
    /// | `STAGING_RETENTION_HOURS` | `24` | Retention window |
    /// | `STAGING_PRESIGN_TTL_SECS` | `3600` | Presigned URL lifetime |
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            bucket: std::env::var("STAGING_BUCKET").unwrap_or(base.bucket),
            prefix: std::env::var("STAGING_PREFIX").unwrap_or(base.prefix),
            endpoint_url: std::env::var("STAGING_ENDPOINT_URL").ok(),
            region: std::env::var("STAGING_REGION").unwrap_or(base.region),
            retention_hours: std::env::var("STAGING_RETENTION_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.retention_hours),
            presign_ttl_secs: std::env::var("STAGING_PRESIGN_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(base.presign_ttl_secs),
        }
    }
}

/// Object stager over an S3-compatible bucket.
///
/// The client is a shared, thread-safe handle; one stager is constructed at
/// process start and injected into the components that need it.
#[derive(Clone)]
pub struct ObjectStager {
    client: aws_sdk_s3::Client,
    config: StagerConfig,
}

impl std::fmt::Debug for ObjectStager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStager")
            .field("config", &self.config)
            .field("client", &"<S3Client>")
            .finish()
    }
}

impl ObjectStager {
    /// Build the SDK client and verify the bucket. A bucket that cannot be
    /// created or verified is `Error::Config`: the process must not serve
    /// traffic against a store it cannot use.
    pub async fn connect(config: StagerConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));
        if let Some(ref url) = config.endpoint_url {
            loader = loader.endpoint_url(url);
        }
        let sdk_config = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if config.endpoint_url.is_some() {
            // Path-style addressing; S3-compatible stores rarely do vhosts.
            builder = builder.force_path_style(true);
        }
        let client = aws_sdk_s3::Client::from_conf(builder.build());

        let stager = Self { client, config };
        stager.ensure_bucket().await?;
        Ok(stager)
    }

    /// Create a stager with a pre-built client (for testing). Skips bucket
    /// verification.
    pub fn with_client(config: StagerConfig, client: aws_sdk_s3::Client) -> Self {
        Self { client, config }
    }

    /// Get the current configuration.
    pub fn config(&self) -> &StagerConfig {
        &self.config
    }

    pub(crate) fn client(&self) -> &aws_sdk_s3::Client {
        &self.client
    }

    /// Idempotently verify or create the staging bucket.
    ///
    /// "Already exists", "already owned by you", and "exists but
    /// forbidden-to-verify" are all non-fatal.
    async fn ensure_bucket(&self) -> Result<()> {
        let bucket = &self.config.bucket;

        if self.client.head_bucket().bucket(bucket).send().await.is_ok() {
            debug!(subsystem = "store", component = "stager", bucket = %bucket, "Bucket verified");
            return Ok(());
        }

        match self.client.create_bucket().bucket(bucket).send().await {
            Ok(_) => {
                info!(subsystem = "store", component = "stager", bucket = %bucket, "Bucket created");
                Ok(())
            }
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_bucket_already_owned_by_you()
                    || service_err.is_bucket_already_exists()
                {
                    debug!(subsystem = "store", component = "stager", bucket = %bucket, "Bucket already exists");
                    return Ok(());
                }
                let msg = service_err.to_string();
                if msg.contains("AccessDenied") || msg.contains("Forbidden") {
                    warn!(
                        subsystem = "store",
                        component = "stager",
                        bucket = %bucket,
                        "Bucket exists but cannot be verified with current credentials"
                    );
                    return Ok(());
                }
                Err(Error::Config(format!(
                    "cannot create or verify bucket '{}': {}",
                    bucket, msg
                )))
            }
        }
    }

    /// Compose a collision-free object key for an upload.
    ///
    /// Prefix + owner + timestamp + random id: repeated uploads of the same
    /// filename by the same owner never collide.
    pub fn build_key(&self, owner: Uuid, filename: &str) -> String {
        format!(
            "{}{}/{}-{}/{}",
            self.config.prefix,
            owner.simple(),
            Utc::now().timestamp(),
            Uuid::new_v4().simple(),
            sanitize_filename(filename)
        )
    }

    /// Stage an upload. Transient store errors surface as
    /// `StoreUnavailable` and are never retried here: retries on write
    /// could double-charge storage, so callers decide.
    pub async fn put(
        &self,
        bytes: Vec<u8>,
        filename: &str,
        owner: Uuid,
        content_type: &str,
    ) -> Result<StagedFile> {
        let key = self.build_key(owner, filename);
        let size_bytes = bytes.len() as i64;
        let created_at = Utc::now();

        debug!(
            subsystem = "store",
            component = "stager",
            op = "put",
            owner_id = %owner,
            object_key = %key,
            size = size_bytes,
            "Staging upload"
        );

        self.client
            .put_object()
            .bucket(&self.config.bucket)
            .key(&key)
            .body(ByteStream::from(bytes))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("put '{}' failed: {}", key, e)))?;

        info!(
            subsystem = "store",
            component = "stager",
            op = "put",
            owner_id = %owner,
            object_key = %key,
            "Upload staged"
        );

        Ok(StagedFile {
            key,
            original_filename: filename.to_string(),
            size_bytes,
            content_type: content_type.to_string(),
            created_at,
            expires_at: created_at + Duration::hours(self.config.retention_hours),
        })
    }

    /// Issue a time-boxed presigned read URL. Never mutates state; a
    /// missing key is `NotFound`.
    pub async fn url(&self, key: &str, ttl: StdDuration) -> Result<String> {
        if !self.exists(key).await? {
            return Err(Error::NotFound(key.to_string()));
        }

        let presigning = PresigningConfig::expires_in(ttl)
            .map_err(|e| Error::Internal(format!("invalid presign TTL: {}", e)))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.config.bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| Error::StoreUnavailable(format!("presign '{}' failed: {}", key, e)))?;

        Ok(presigned.uri().to_string())
    }

    /// Delete a staged object. Idempotent: a missing key returns `false`
    /// rather than an error.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        // S3 DeleteObject succeeds on missing keys, so probe first to
        // report whether anything was actually removed.
        if !self.exists(key).await? {
            return Ok(false);
        }

        self.client
            .delete_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::StoreUnavailable(format!("delete '{}' failed: {}", key, e)))?;

        debug!(
            subsystem = "store",
            component = "stager",
            op = "delete",
            object_key = %key,
            "Staged object deleted"
        );
        Ok(true)
    }

    /// Whether a key exists in the bucket.
    async fn exists(&self, key: &str) -> Result<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.config.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(Error::StoreUnavailable(format!(
                        "head '{}' failed: {}",
                        key, service_err
                    )))
                }
            }
        }
    }
}

/// Strip path separators and control characters from an uploaded filename.
/// Non-ASCII text (Persian filenames) passes through untouched.
pub fn sanitize_filename(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '/' | '\\' => '_',
            c => c,
        })
        .collect();

    let trimmed = cleaned.trim().trim_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StagerConfig::default();
        assert_eq!(config.bucket, "goftar-staging");
        assert_eq!(config.prefix, defaults::STAGING_PREFIX);
        assert_eq!(config.retention_hours, 24);
        assert!(config.endpoint_url.is_none());
    }

    #[test]
    fn test_config_builder_chain() {
        let config = StagerConfig::new("uploads")
            .with_endpoint_url("http://localhost:9000")
            .with_prefix("tmp/");
        assert_eq!(config.bucket, "uploads");
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:9000"));
        assert_eq!(config.prefix, "tmp/");
    }

    #[test]
    fn test_sanitize_filename_strips_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_filename("a\\b.txt"), "a_b.txt");
    }

    #[test]
    fn test_sanitize_filename_keeps_persian() {
        assert_eq!(sanitize_filename("گزارش ماهانه.pdf"), "گزارش ماهانه.pdf");
    }

    #[test]
    fn test_sanitize_filename_never_empty() {
        assert_eq!(sanitize_filename(""), "file");
        assert_eq!(sanitize_filename("..."), "file");
    }

    #[tokio::test]
    async fn test_build_key_unique_for_same_filename_and_owner() {
        let config = StagerConfig::default();
        let sdk = aws_sdk_s3::Config::builder()
            .behavior_version(aws_sdk_s3::config::BehaviorVersion::latest())
            .region(aws_sdk_s3::config::Region::new("us-east-1"))
            .build();
        let stager = ObjectStager::with_client(config, aws_sdk_s3::Client::from_conf(sdk));

        let owner = Uuid::new_v4();
        let a = stager.build_key(owner, "invoice.pdf");
        let b = stager.build_key(owner, "invoice.pdf");

        assert_ne!(a, b);
        assert!(a.starts_with(&format!("staging/{}/", owner.simple())));
        assert!(a.ends_with("/invoice.pdf"));
    }
}
