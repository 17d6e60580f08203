//! S3-compatible object store client.

use std::path::Path;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::error::{StorageError, StorageResult};
use crate::keys::{upload_key, UPLOAD_PREFIX};

/// Configuration for the object store client.
#[derive(Debug, Clone)]
pub struct ObjectStoreConfig {
    /// S3 API endpoint URL
    pub endpoint_url: String,
    /// Access key ID
    pub access_key_id: String,
    /// Secret access key
    pub secret_access_key: String,
    /// Bucket name
    pub bucket_name: String,
    /// Region ("auto" for R2-style endpoints)
    pub region: String,
    /// Presigned URL lifetime
    pub presign_expiry: Duration,
}

impl ObjectStoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self {
            endpoint_url: std::env::var("SWAP_STORE_ENDPOINT")
                .map_err(|_| StorageError::config_error("SWAP_STORE_ENDPOINT not set"))?,
            access_key_id: std::env::var("SWAP_STORE_ACCESS_KEY_ID")
                .map_err(|_| StorageError::config_error("SWAP_STORE_ACCESS_KEY_ID not set"))?,
            secret_access_key: std::env::var("SWAP_STORE_SECRET_ACCESS_KEY")
                .map_err(|_| StorageError::config_error("SWAP_STORE_SECRET_ACCESS_KEY not set"))?,
            bucket_name: std::env::var("SWAP_STORE_BUCKET")
                .map_err(|_| StorageError::config_error("SWAP_STORE_BUCKET not set"))?,
            region: std::env::var("SWAP_STORE_REGION").unwrap_or_else(|_| "auto".to_string()),
            presign_expiry: Duration::from_secs(24 * 3600),
        })
    }
}

/// A completed upload: where it landed and the URL the vendor can fetch.
#[derive(Debug, Clone)]
pub struct UploadResult {
    /// Object key in the bucket
    pub key: String,
    /// Presigned GET URL
    pub url: String,
    /// When the URL stops working
    pub expires_at: DateTime<Utc>,
}

/// Information about a stored object.
#[derive(Debug, Clone)]
pub struct ObjectInfo {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last modified timestamp (milliseconds since epoch)
    pub last_modified: Option<u64>,
}

/// Object store client over any S3-compatible endpoint.
#[derive(Clone)]
pub struct ObjectStore {
    client: Client,
    bucket: String,
    presign_expiry: Duration,
}

impl ObjectStore {
    /// Create a new client from configuration.
    pub fn new(config: ObjectStoreConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_key_id,
            &config.secret_access_key,
            None,
            None,
            "fswap",
        );

        let sdk_config = Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(&config.endpoint_url)
            .region(Region::new(config.region))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            client: Client::from_conf(sdk_config),
            bucket: config.bucket_name,
            presign_expiry: config.presign_expiry,
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> StorageResult<Self> {
        Ok(Self::new(ObjectStoreConfig::from_env()?))
    }

    /// Upload a file under the given key.
    pub async fn upload_file(
        &self,
        path: impl AsRef<Path>,
        key: &str,
        content_type: &str,
    ) -> StorageResult<()> {
        let path = path.as_ref();
        debug!("Uploading {} to {}", path.display(), key);

        let body = ByteStream::from_path(path)
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| StorageError::upload_failed(e.to_string()))?;

        info!("Uploaded {} to {}", path.display(), key);
        Ok(())
    }

    /// Upload a local media file and return a presigned URL for it.
    ///
    /// The key is derived from the filename with a UUID prefix so repeated
    /// uploads of the same file never overwrite each other.
    pub async fn upload_media(&self, path: impl AsRef<Path>) -> StorageResult<UploadResult> {
        let path = path.as_ref();
        let key = upload_key(path);
        let content_type = content_type_for(path);

        self.upload_file(path, &key, content_type).await?;
        let url = self.presign_get(&key, self.presign_expiry).await?;

        Ok(UploadResult {
            key,
            url,
            expires_at: Utc::now() + chrono::Duration::from_std(self.presign_expiry).unwrap_or(chrono::Duration::hours(24)),
        })
    }

    /// Generate a presigned GET URL.
    pub async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        let presign_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        let presigned = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign_config)
            .await
            .map_err(|e| StorageError::PresignFailed(e.to_string()))?;

        Ok(presigned.uri().to_string())
    }

    /// Delete an object.
    pub async fn delete_object(&self, key: &str) -> StorageResult<()> {
        debug!("Deleting {}", key);

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| StorageError::delete_failed(e.to_string()))?;

        Ok(())
    }

    /// List objects with a prefix.
    pub async fn list_objects(&self, prefix: &str) -> StorageResult<Vec<ObjectInfo>> {
        debug!("Listing objects with prefix: {}", prefix);

        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let response = request
                .send()
                .await
                .map_err(|e| StorageError::ListFailed(e.to_string()))?;

            if let Some(ref contents) = response.contents {
                for obj in contents {
                    objects.push(ObjectInfo {
                        key: obj.key.clone().unwrap_or_default(),
                        size: obj.size.unwrap_or(0) as u64,
                        last_modified: obj
                            .last_modified
                            .as_ref()
                            .and_then(|t| t.to_millis().ok())
                            .map(|ms| ms as u64),
                    });
                }
            }

            if response.is_truncated() == Some(true) {
                continuation_token = response.next_continuation_token;
            } else {
                break;
            }
        }

        Ok(objects)
    }

    /// Delete uploaded inputs older than `min_age`, returning how many went.
    ///
    /// Per-object delete failures are logged and skipped so one stuck object
    /// never aborts the sweep.
    pub async fn cleanup_older_than(&self, min_age: Duration) -> StorageResult<u32> {
        let objects = self.list_objects(UPLOAD_PREFIX).await?;
        let cutoff_ms = (Utc::now() - chrono::Duration::from_std(min_age).unwrap_or(chrono::Duration::hours(24)))
            .timestamp_millis() as u64;

        let mut deleted = 0u32;
        for obj in objects {
            // Objects with no timestamp are kept; age cannot be proven
            let Some(modified) = obj.last_modified else {
                continue;
            };
            if modified >= cutoff_ms {
                continue;
            }

            match self.delete_object(&obj.key).await {
                Ok(()) => deleted += 1,
                Err(e) => warn!("Failed to delete {}: {}", obj.key, e),
            }
        }

        info!("Cleanup removed {} objects under {}", deleted, UPLOAD_PREFIX);
        Ok(deleted)
    }
}

/// Map a file extension to the content type sent with the upload.
pub fn content_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("bmp") => "image/bmp",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("avi") => "video/x-msvideo",
        Some("mov") => "video/quicktime",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for(&PathBuf::from("a.JPG")), "image/jpeg");
        assert_eq!(content_type_for(&PathBuf::from("a.webp")), "image/webp");
        assert_eq!(content_type_for(&PathBuf::from("clip.mov")), "video/quicktime");
        assert_eq!(
            content_type_for(&PathBuf::from("noext")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_config_from_env_missing() {
        // Isolate from any ambient environment
        std::env::remove_var("SWAP_STORE_ENDPOINT");
        let err = ObjectStoreConfig::from_env().unwrap_err();
        assert!(matches!(err, StorageError::ConfigError(_)));
    }
}
