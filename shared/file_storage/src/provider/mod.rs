//! Object store capability used by the file storage facade
//!
//! The facade only talks to an [`ObjectStoreClient`]. The S3 implementation lives in [`s3`];
//! [`memory`] provides an in-process store for tests and local development.

mod error;
pub mod memory;
pub mod s3;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use error::{ProviderError, ProviderErrorKind, ProviderResult};

/// Bucket metadata as reported by the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketInfo {
    /// Bucket name
    pub name: String,
    /// Creation timestamp, when the provider reports one
    pub creation_date: Option<DateTime<Utc>>,
}

/// Primitive operations of an S3-compatible object store
///
/// Implementations must be safe to share across tasks; the facade calls them concurrently
/// through a single `Arc`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// Lists the keys of a bucket (a single provider page)
    async fn list_objects(&self, bucket: &str) -> ProviderResult<Vec<String>>;

    /// Writes an object, returning the key the provider reports as stored
    async fn put_object(&self, bucket: &str, key: &str, content: Bytes)
        -> ProviderResult<Option<String>>;

    /// Reads a whole object into memory
    async fn get_object(&self, bucket: &str, key: &str) -> ProviderResult<Bytes>;

    /// Deletes a batch of objects, returning the keys the provider confirmed as deleted
    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> ProviderResult<Vec<String>>;

    /// Lists the buckets of the account
    async fn list_buckets(&self) -> ProviderResult<Vec<BucketInfo>>;

    /// Probes a bucket for existence
    async fn head_bucket(&self, bucket: &str) -> ProviderResult<()>;

    /// Creates a bucket in the given region
    async fn create_bucket(&self, bucket: &str, region: &str) -> ProviderResult<()>;

    /// Deletes an empty bucket
    async fn delete_bucket(&self, bucket: &str) -> ProviderResult<()>;
}
