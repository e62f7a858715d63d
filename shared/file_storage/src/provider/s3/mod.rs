//! S3 implementation of the object store capability

pub mod transfer;

use async_trait::async_trait;
use aws_sdk_s3::{
    config::{retry::RetryConfig, BehaviorVersion, Credentials, Region},
    error::BuildError,
    types::{
        BucketLocationConstraint, CreateBucketConfiguration, Delete, DeletedObject, Object,
        ObjectIdentifier,
    },
    Client,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use tracing::info;

use super::{BucketInfo, ObjectStoreClient, ProviderError, ProviderErrorKind, ProviderResult};
use crate::config::StorageConfig;
pub use transfer::{Downloader, TransferOptions, Uploader};

/// Region in which S3 rejects an explicit location constraint
const DEFAULT_REGION: &str = "us-east-1";

/// Name under which the static credentials are registered with the SDK
const CREDENTIALS_PROVIDER_NAME: &str = "file-storage";

/// S3 object store with its transfer helpers
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    uploader: Uploader,
    downloader: Downloader,
}

impl S3ObjectStore {
    /// Wraps a pre-configured S3 client using default transfer options
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self::with_transfer_options(client, TransferOptions::default())
    }

    /// Wraps a pre-configured S3 client, sharing it with the uploader and downloader
    #[must_use]
    pub fn with_transfer_options(client: Client, options: TransferOptions) -> Self {
        Self {
            uploader: Uploader::new(client.clone(), options),
            downloader: Downloader::new(client.clone(), options),
            client,
        }
    }

    /// Builds an S3 client from static credentials
    ///
    /// A custom endpoint switches to path-style addressing, which S3-compatible providers
    /// such as `MinIO` and `LocalStack` expect.
    #[must_use]
    pub fn from_config(config: &StorageConfig) -> Self {
        let credentials = Credentials::new(
            &config.access_id,
            &config.secret_key,
            config.token.clone(),
            None,
            CREDENTIALS_PROVIDER_NAME,
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .retry_config(RetryConfig::standard());

        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        info!(
            region = %config.region,
            endpoint = config.endpoint.as_deref().unwrap_or("default"),
            "Initialized S3 client"
        );

        Self::new(Client::from_conf(builder.build()))
    }

    /// Returns the underlying S3 client
    #[must_use]
    pub const fn client(&self) -> &Client {
        &self.client
    }
}

fn invalid_request(error: &BuildError) -> ProviderError {
    ProviderError::new(
        ProviderErrorKind::Other,
        None,
        format!("invalid request: {error}"),
    )
}

#[async_trait]
impl ObjectStoreClient for S3ObjectStore {
    async fn list_objects(&self, bucket: &str) -> ProviderResult<Vec<String>> {
        let output = self.client.list_objects().bucket(bucket).send().await?;

        Ok(output
            .contents()
            .iter()
            .filter_map(Object::key)
            .map(ToString::to_string)
            .collect())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        content: Bytes,
    ) -> ProviderResult<Option<String>> {
        self.uploader.upload(bucket, key, content).await
    }

    async fn get_object(&self, bucket: &str, key: &str) -> ProviderResult<Bytes> {
        self.downloader.download(bucket, key).await
    }

    async fn delete_objects(&self, bucket: &str, keys: &[String]) -> ProviderResult<Vec<String>> {
        let objects = keys
            .iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| invalid_request(&e))?;
        let delete = Delete::builder()
            .set_objects(Some(objects))
            .build()
            .map_err(|e| invalid_request(&e))?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket)
            .delete(delete)
            .send()
            .await?;

        Ok(output
            .deleted()
            .iter()
            .filter_map(DeletedObject::key)
            .map(ToString::to_string)
            .collect())
    }

    async fn list_buckets(&self) -> ProviderResult<Vec<BucketInfo>> {
        let output = self.client.list_buckets().send().await?;

        Ok(output
            .buckets()
            .iter()
            .map(|bucket| BucketInfo {
                name: bucket.name().unwrap_or_default().to_string(),
                creation_date: bucket.creation_date().and_then(|date| {
                    DateTime::<Utc>::from_timestamp(date.secs(), date.subsec_nanos())
                }),
            })
            .collect())
    }

    async fn head_bucket(&self, bucket: &str) -> ProviderResult<()> {
        self.client.head_bucket().bucket(bucket).send().await?;
        Ok(())
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> ProviderResult<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if region != DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        request.send().await?;

        Ok(())
    }

    async fn delete_bucket(&self, bucket: &str) -> ProviderResult<()> {
        self.client.delete_bucket().bucket(bucket).send().await?;
        Ok(())
    }
}
