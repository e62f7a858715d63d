//! LocalStack test setup utilities

use std::sync::Arc;

use file_storage::provider::s3::{S3ObjectStore, TransferOptions};
use file_storage::{FileStorage, StorageConfig};
use uuid::Uuid;

/// Test configuration for LocalStack
pub const LOCALSTACK_ENDPOINT: &str = "http://localhost:4566";
pub const TEST_REGION: &str = "us-east-1";

/// Part size used by the tests, the smallest S3 accepts
pub const TEST_PART_SIZE: usize = 5 * 1024 * 1024;

/// Test context holding a facade and a freshly created bucket
pub struct LocalStackContext {
    pub storage: FileStorage,
    pub bucket: String,
}

impl LocalStackContext {
    /// Creates a facade against LocalStack and a unique bucket
    pub async fn new(test_name: &str) -> Self {
        let config = StorageConfig {
            access_id: "test".to_string(),
            secret_key: "test".to_string(),
            token: None,
            region: TEST_REGION.to_string(),
            endpoint: Some(LOCALSTACK_ENDPOINT.to_string()),
        }
        .validated()
        .expect("LocalStack config must be valid");

        let store = S3ObjectStore::from_config(&config);
        let store = S3ObjectStore::with_transfer_options(
            store.client().clone(),
            TransferOptions {
                part_size: TEST_PART_SIZE,
                concurrency: 4,
            },
        );
        let storage = FileStorage::new(Arc::new(store), config.region);

        let bucket = format!("{test_name}-{}", Uuid::new_v4());
        storage
            .create_bucket(&bucket)
            .await
            .expect("Failed to create test bucket");

        Self { storage, bucket }
    }

    /// Removes every object and the bucket itself
    pub async fn cleanup(self) {
        let keys = self.storage.list(&self.bucket).await.unwrap_or_default();
        if !keys.is_empty() {
            let _ = self.storage.delete(&self.bucket, &keys).await;
        }
        let _ = self.storage.delete_bucket(&self.bucket).await;
    }
}
