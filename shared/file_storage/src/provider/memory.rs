//! In-process object store
//!
//! Behaves like a strict S3 provider: batch deletes only confirm keys that actually existed,
//! and buckets must be empty before they can be removed.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use super::{BucketInfo, ObjectStoreClient, ProviderError, ProviderResult};

#[derive(Debug)]
struct MemoryBucket {
    creation_date: DateTime<Utc>,
    objects: BTreeMap<String, Bytes>,
}

/// Object store backed by process memory
#[derive(Debug, Default)]
pub struct InMemoryObjectStore {
    buckets: RwLock<BTreeMap<String, MemoryBucket>>,
}

fn no_such_bucket(bucket: &str) -> ProviderError {
    ProviderError::not_found(
        "NoSuchBucket",
        format!("the specified bucket does not exist: {bucket}"),
    )
}

impl InMemoryObjectStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given buckets, each empty
    #[must_use]
    pub fn with_buckets<I, S>(buckets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let now = Utc::now();
        let buckets = buckets
            .into_iter()
            .map(|name| {
                (
                    name.into(),
                    MemoryBucket {
                        creation_date: now,
                        objects: BTreeMap::new(),
                    },
                )
            })
            .collect();

        Self {
            buckets: RwLock::new(buckets),
        }
    }
}

#[async_trait]
impl ObjectStoreClient for InMemoryObjectStore {
    async fn list_objects(&self, bucket: &str) -> ProviderResult<Vec<String>> {
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        let entry = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;

        Ok(entry.objects.keys().cloned().collect())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content: Bytes,
    ) -> ProviderResult<Option<String>> {
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        let entry = buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;
        entry.objects.insert(key.to_string(), content);

        Ok(Some(key.to_string()))
    }

    async fn get_object(&self, bucket: &str, key: &str) -> ProviderResult<Bytes> {
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        let entry = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;

        entry.objects.get(key).cloned().ok_or_else(|| {
            ProviderError::not_found("NoSuchKey", format!("the specified key does not exist: {key}"))
        })
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> ProviderResult<Vec<String>> {
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        let entry = buckets
            .get_mut(bucket)
            .ok_or_else(|| no_such_bucket(bucket))?;

        Ok(keys
            .iter()
            .filter(|key| entry.objects.remove(key.as_str()).is_some())
            .cloned()
            .collect())
    }

    async fn list_buckets(&self) -> ProviderResult<Vec<BucketInfo>> {
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);

        Ok(buckets
            .iter()
            .map(|(name, entry)| BucketInfo {
                name: name.clone(),
                creation_date: Some(entry.creation_date),
            })
            .collect())
    }

    async fn head_bucket(&self, bucket: &str) -> ProviderResult<()> {
        let buckets = self.buckets.read().unwrap_or_else(PoisonError::into_inner);
        if buckets.contains_key(bucket) {
            Ok(())
        } else {
            Err(ProviderError::not_found("NotFound", "Not Found"))
        }
    }

    async fn create_bucket(&self, bucket: &str, _region: &str) -> ProviderResult<()> {
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        if buckets.contains_key(bucket) {
            return Err(ProviderError::other(
                "BucketAlreadyOwnedByYou",
                format!("bucket already exists: {bucket}"),
            ));
        }
        buckets.insert(
            bucket.to_string(),
            MemoryBucket {
                creation_date: Utc::now(),
                objects: BTreeMap::new(),
            },
        );

        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> ProviderResult<()> {
        let mut buckets = self.buckets.write().unwrap_or_else(PoisonError::into_inner);
        let entry = buckets.get(bucket).ok_or_else(|| no_such_bucket(bucket))?;
        if !entry.objects.is_empty() {
            return Err(ProviderError::other(
                "BucketNotEmpty",
                format!("the bucket you tried to delete is not empty: {bucket}"),
            ));
        }
        buckets.remove(bucket);

        Ok(())
    }
}
