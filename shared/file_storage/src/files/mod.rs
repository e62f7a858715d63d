//! Bucket-scoped file storage facade
//!
//! [`FileStorage`] validates arguments, delegates to an [`ObjectStoreClient`] and translates the
//! outcome into a [`FileStorageError`]. It holds no mutable state, so one instance can be shared
//! between tasks. Operations add no retries or timeouts of their own: wrap a call in
//! `tokio::time::timeout` to bound it, or drop the future to cancel it.

mod error;

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info};
use validator::Validate;

pub use error::{FileStorageError, FileStorageResult};

use crate::config::{ConfigError, StorageConfig};
use crate::provider::{s3::S3ObjectStore, BucketInfo, ObjectStoreClient, ProviderError};

/// File and bucket operations over an S3-compatible provider
#[derive(Clone)]
pub struct FileStorage {
    client: Arc<dyn ObjectStoreClient>,
    region: String,
}

fn require_bucket(bucket: &str) -> FileStorageResult<()> {
    if bucket.is_empty() {
        return Err(FileStorageError::InvalidArgument(
            "empty bucket name".to_string(),
        ));
    }
    Ok(())
}

/// Checks whether the last path segment of `key` carries an extension
fn has_extension(key: &str) -> bool {
    key.rsplit('/')
        .next()
        .is_some_and(|name| name.contains('.'))
}

fn provider_failure(
    operation: &'static str,
    context: String,
    source: ProviderError,
) -> FileStorageError {
    error!(operation, context = %context, error = %source, "Provider call failed");
    FileStorageError::provider(operation, context, source)
}

impl FileStorage {
    /// Creates a facade over the given object store
    ///
    /// # Arguments
    ///
    /// * `client` - Shared provider client, safe for concurrent use
    /// * `region` - Region new buckets are created in
    #[must_use]
    pub fn new(client: Arc<dyn ObjectStoreClient>, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    /// Validates the configuration and creates a facade over S3
    ///
    /// # Errors
    ///
    /// Returns `FileStorageError::Config` if the configuration is invalid
    pub fn from_config(config: &StorageConfig) -> FileStorageResult<Self> {
        config.validate().map_err(ConfigError::from)?;
        let store = S3ObjectStore::from_config(config);

        Ok(Self::new(Arc::new(store), config.region.clone()))
    }

    /// Returns the region new buckets are created in
    #[must_use]
    pub fn region(&self) -> &str {
        &self.region
    }

    /// Lists the keys of a bucket that carry a file extension
    ///
    /// Keys without an extension, such as directory markers (`folder/`), are skipped. Only the
    /// first page returned by the provider is read.
    ///
    /// # Errors
    ///
    /// Returns `FileStorageError::InvalidArgument` if `bucket` is empty
    /// Returns `FileStorageError::Provider` if the listing fails
    pub async fn list(&self, bucket: &str) -> FileStorageResult<Vec<String>> {
        require_bucket(bucket)?;
        debug!(bucket, "Listing objects");

        let keys = self
            .client
            .list_objects(bucket)
            .await
            .map_err(|e| provider_failure("ListObjects", format!("bucket {bucket}"), e))?;

        Ok(keys.into_iter().filter(|key| has_extension(key)).collect())
    }

    /// Uploads `content` to `bucket/key`, overwriting any existing object
    ///
    /// Large content is sent as a multipart upload.
    ///
    /// # Returns
    ///
    /// The key the provider stored the object under
    ///
    /// # Errors
    ///
    /// Returns `FileStorageError::InvalidArgument` if `bucket` or `content` is empty
    /// Returns `FileStorageError::Provider` if the upload fails
    /// Returns `FileStorageError::InvariantViolation` if the provider returns no key
    pub async fn upload(
        &self,
        bucket: &str,
        key: &str,
        content: impl Into<Bytes> + Send,
    ) -> FileStorageResult<String> {
        require_bucket(bucket)?;
        let content = content.into();
        if content.is_empty() {
            return Err(FileStorageError::InvalidArgument(
                "empty file content".to_string(),
            ));
        }
        debug!(bucket, key, size = content.len(), "Uploading file");

        let stored_key = self
            .client
            .put_object(bucket, key, content)
            .await
            .map_err(|e| provider_failure("Upload", format!("bucket {bucket}, key {key}"), e))?
            .filter(|stored| !stored.is_empty())
            .ok_or_else(|| {
                FileStorageError::InvariantViolation(format!(
                    "received empty key for file uploaded to {bucket}/{key}"
                ))
            })?;

        info!(bucket, key = %stored_key, "Uploaded file");
        Ok(stored_key)
    }

    /// Downloads the object at `bucket/key`
    ///
    /// The whole object is buffered in memory, so memory use grows with the object size.
    ///
    /// # Errors
    ///
    /// Returns `FileStorageError::InvalidArgument` if `bucket` or `key` is empty
    /// Returns `FileStorageError::Provider` if the object does not exist or the transfer fails
    pub async fn download(&self, bucket: &str, key: &str) -> FileStorageResult<Bytes> {
        require_bucket(bucket)?;
        if key.is_empty() {
            return Err(FileStorageError::InvalidArgument(
                "empty file path".to_string(),
            ));
        }
        debug!(bucket, key, "Downloading file");

        self.client
            .get_object(bucket, key)
            .await
            .map_err(|e| provider_failure("Download", format!("bucket {bucket}, key {key}"), e))
    }

    /// Deletes a batch of files with a single request
    ///
    /// Succeeds only if the provider confirms every key as deleted.
    ///
    /// # Errors
    ///
    /// Returns `FileStorageError::InvalidArgument` if `bucket` or `keys` is empty
    /// Returns `FileStorageError::Provider` if the request fails
    /// Returns `FileStorageError::PartialDelete` naming the first unconfirmed key
    pub async fn delete(&self, bucket: &str, keys: &[String]) -> FileStorageResult<()> {
        require_bucket(bucket)?;
        if keys.is_empty() {
            return Err(FileStorageError::InvalidArgument(
                "empty list of files to delete".to_string(),
            ));
        }
        debug!(bucket, count = keys.len(), "Deleting files");

        let deleted = self
            .client
            .delete_objects(bucket, keys)
            .await
            .map_err(|e| provider_failure("DeleteObjects", format!("bucket {bucket}"), e))?;

        let deleted: HashSet<&str> = deleted.iter().map(String::as_str).collect();
        if let Some(missing) = keys.iter().find(|key| !deleted.contains(key.as_str())) {
            error!(bucket, key = %missing, "Provider did not confirm deletion");
            return Err(FileStorageError::PartialDelete {
                bucket: bucket.to_string(),
                key: missing.clone(),
            });
        }

        info!(bucket, count = keys.len(), "Deleted files");
        Ok(())
    }

    /// Lists the buckets of the account as reported by the provider
    ///
    /// # Errors
    ///
    /// Returns `FileStorageError::Provider` if the listing fails
    pub async fn list_buckets(&self) -> FileStorageResult<Vec<BucketInfo>> {
        debug!("Listing buckets");

        self.client
            .list_buckets()
            .await
            .map_err(|e| provider_failure("ListBuckets", "account".to_string(), e))
    }

    /// Checks whether a bucket exists
    ///
    /// # Returns
    ///
    /// * `Ok(true)` if the bucket exists
    /// * `Ok(false)` if the provider reports it as not found
    ///
    /// # Errors
    ///
    /// Returns `FileStorageError::InvalidArgument` if `bucket` is empty
    /// Returns `FileStorageError::Provider` for any failure other than not found
    pub async fn bucket_exists(&self, bucket: &str) -> FileStorageResult<bool> {
        require_bucket(bucket)?;

        match self.client.head_bucket(bucket).await {
            Ok(()) => Ok(true),
            Err(e) if e.is_not_found() => {
                debug!(bucket, "Bucket does not exist");
                Ok(false)
            }
            Err(e) => Err(provider_failure("HeadBucket", format!("bucket {bucket}"), e)),
        }
    }

    /// Creates a bucket in the configured region
    ///
    /// # Errors
    ///
    /// Returns `FileStorageError::InvalidArgument` if `bucket` is empty
    /// Returns `FileStorageError::Provider` if the bucket cannot be created
    pub async fn create_bucket(&self, bucket: &str) -> FileStorageResult<()> {
        require_bucket(bucket)?;

        self.client
            .create_bucket(bucket, &self.region)
            .await
            .map_err(|e| {
                provider_failure(
                    "CreateBucket",
                    format!("bucket {bucket} in region {}", self.region),
                    e,
                )
            })?;

        info!(bucket, region = %self.region, "Created bucket");
        Ok(())
    }

    /// Deletes an empty bucket
    ///
    /// # Errors
    ///
    /// Returns `FileStorageError::InvalidArgument` if `bucket` is empty
    /// Returns `FileStorageError::Provider` if the bucket cannot be deleted, including when it
    /// still holds objects
    pub async fn delete_bucket(&self, bucket: &str) -> FileStorageResult<()> {
        require_bucket(bucket)?;

        self.client
            .delete_bucket(bucket)
            .await
            .map_err(|e| provider_failure("DeleteBucket", format!("bucket {bucket}"), e))?;

        info!(bucket, "Deleted bucket");
        Ok(())
    }
}
