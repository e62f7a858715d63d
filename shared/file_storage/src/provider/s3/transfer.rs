//! Chunked transfer helpers for S3
//!
//! The [`Uploader`] switches to a multipart upload once the content exceeds one part and sends
//! the parts concurrently. The [`Downloader`] splits large objects into ranged `GetObject`
//! requests and reassembles them in order. Both buffer whole objects in memory.

use std::ops::Range;

use aws_sdk_s3::{
    error::DisplayErrorContext,
    primitives::ByteStream,
    types::{CompletedMultipartUpload, CompletedPart},
    Client,
};
use bytes::{Bytes, BytesMut};
use futures::{stream, StreamExt, TryStreamExt};
use tracing::{debug, warn};

use crate::provider::{ProviderError, ProviderErrorKind, ProviderResult};

/// Smallest part size S3 accepts for every part but the last one
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Default number of parts transferred at the same time
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Upper bound on the number of parts in a multipart upload
const MAX_UPLOAD_PARTS: usize = 10_000;

/// Part size and parallelism of a transfer helper
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOptions {
    /// Size of each part in bytes, at least [`MIN_PART_SIZE`]
    pub part_size: usize,
    /// Number of parts in flight, at least 1
    pub concurrency: usize,
}

impl Default for TransferOptions {
    fn default() -> Self {
        Self {
            part_size: MIN_PART_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl TransferOptions {
    /// Clamps the options to the limits S3 enforces
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            part_size: self.part_size.max(MIN_PART_SIZE),
            concurrency: self.concurrency.max(1),
        }
    }
}

/// Splits `len` bytes into consecutive half-open ranges of at most `part_size` bytes
pub(crate) fn part_ranges(len: usize, part_size: usize) -> Vec<Range<usize>> {
    let part_size = part_size.max(1);
    let mut ranges = Vec::with_capacity(len.div_ceil(part_size));
    let mut start = 0;
    while start < len {
        let end = start.saturating_add(part_size).min(len);
        ranges.push(start..end);
        start = end;
    }
    ranges
}

/// Multipart-aware uploader sharing the client's connection pool
#[derive(Debug, Clone)]
pub struct Uploader {
    client: Client,
    options: TransferOptions,
}

impl Uploader {
    /// Creates an uploader with the given transfer options
    #[must_use]
    pub fn new(client: Client, options: TransferOptions) -> Self {
        Self {
            client,
            options: options.normalized(),
        }
    }

    /// Uploads `content` to `bucket/key`, returning the key reported by S3
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if any request fails. A failed multipart upload is aborted before
    /// the error is returned.
    pub async fn upload(
        &self,
        bucket: &str,
        key: &str,
        content: Bytes,
    ) -> ProviderResult<Option<String>> {
        if content.len() <= self.options.part_size {
            self.client
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(content))
                .send()
                .await?;

            return Ok(Some(key.to_string()));
        }

        let created = self
            .client
            .create_multipart_upload()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;
        let upload_id = created.upload_id().ok_or_else(|| {
            ProviderError::new(
                ProviderErrorKind::Other,
                None,
                format!("multipart upload for {bucket}/{key} returned no upload id"),
            )
        })?;

        debug!(bucket, key, upload_id, size = content.len(), "Started multipart upload");

        match self.upload_parts(bucket, key, upload_id, &content).await {
            Ok(stored_key) => Ok(stored_key),
            Err(err) => {
                self.abort(bucket, key, upload_id).await;
                Err(err)
            }
        }
    }

    async fn upload_parts(
        &self,
        bucket: &str,
        key: &str,
        upload_id: &str,
        content: &Bytes,
    ) -> ProviderResult<Option<String>> {
        // Grow the parts when the content would not fit into the part limit
        let part_size = self
            .options
            .part_size
            .max(content.len().div_ceil(MAX_UPLOAD_PARTS));

        let parts = stream::iter(part_ranges(content.len(), part_size).into_iter().enumerate())
            .map(|(index, range)| {
                let body = content.slice(range);
                async move {
                    let part_number = i32::try_from(index + 1).map_err(|_| {
                        ProviderError::new(
                            ProviderErrorKind::Other,
                            None,
                            format!("part number {} out of range", index + 1),
                        )
                    })?;

                    let output = self
                        .client
                        .upload_part()
                        .bucket(bucket)
                        .key(key)
                        .upload_id(upload_id)
                        .part_number(part_number)
                        .body(ByteStream::from(body))
                        .send()
                        .await?;

                    Ok::<_, ProviderError>(
                        CompletedPart::builder()
                            .part_number(part_number)
                            .set_e_tag(output.e_tag().map(ToString::to_string))
                            .build(),
                    )
                }
            })
            .buffered(self.options.concurrency)
            .try_collect::<Vec<_>>()
            .await?;

        let part_count = parts.len();
        let output = self
            .client
            .complete_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .multipart_upload(
                CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build(),
            )
            .send()
            .await?;

        debug!(bucket, key, upload_id, parts = part_count, "Completed multipart upload");

        Ok(output.key().map(ToString::to_string))
    }

    async fn abort(&self, bucket: &str, key: &str, upload_id: &str) {
        if let Err(err) = self
            .client
            .abort_multipart_upload()
            .bucket(bucket)
            .key(key)
            .upload_id(upload_id)
            .send()
            .await
        {
            warn!(
                bucket,
                key,
                upload_id,
                error = %DisplayErrorContext(&err),
                "Failed to abort multipart upload"
            );
        }
    }
}

fn transfer_mismatch(bucket: &str, key: &str, detail: &str) -> ProviderError {
    ProviderError::new(
        ProviderErrorKind::Other,
        None,
        format!("download of {bucket}/{key} returned unexpected data: {detail}"),
    )
}

/// Fails unless `actual` bytes were received where `expected` were requested
fn check_length(bucket: &str, key: &str, actual: usize, expected: usize) -> ProviderResult<()> {
    if actual == expected {
        Ok(())
    } else {
        Err(transfer_mismatch(
            bucket,
            key,
            &format!("received {actual} bytes, expected {expected}"),
        ))
    }
}

/// Fails unless a `Content-Range` header (`bytes start-end/total`) matches the requested range
fn check_content_range(
    bucket: &str,
    key: &str,
    content_range: &str,
    range: &Range<usize>,
    total: usize,
) -> ProviderResult<()> {
    let expected = format!("bytes {}-{}/{total}", range.start, range.end - 1);
    if content_range.trim() == expected {
        Ok(())
    } else {
        Err(transfer_mismatch(
            bucket,
            key,
            &format!("content range {content_range:?}, expected {expected:?}"),
        ))
    }
}

/// Ranged, concurrent downloader sharing the client's connection pool
#[derive(Debug, Clone)]
pub struct Downloader {
    client: Client,
    options: TransferOptions,
}

impl Downloader {
    /// Creates a downloader with the given transfer options
    #[must_use]
    pub fn new(client: Client, options: TransferOptions) -> Self {
        Self {
            client,
            options: options.normalized(),
        }
    }

    /// Downloads the whole object at `bucket/key` into memory
    ///
    /// # Errors
    ///
    /// Returns `ProviderError` if the object does not exist or any request fails
    pub async fn download(&self, bucket: &str, key: &str) -> ProviderResult<Bytes> {
        let head = self
            .client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;

        let len = head
            .content_length()
            .map(usize::try_from)
            .transpose()
            .map_err(|_| {
                ProviderError::new(
                    ProviderErrorKind::Other,
                    None,
                    format!("invalid content length for {bucket}/{key}"),
                )
            })?
            .unwrap_or_default();

        let etag = head.e_tag();

        if len <= self.options.part_size {
            let output = self
                .client
                .get_object()
                .bucket(bucket)
                .key(key)
                .set_if_match(etag.map(ToString::to_string))
                .send()
                .await?;
            let body = output.body.collect().await?.into_bytes();
            check_length(bucket, key, body.len(), len)?;
            return Ok(body);
        }

        let ranges = part_ranges(len, self.options.part_size);
        debug!(bucket, key, size = len, parts = ranges.len(), "Starting ranged download");

        let parts = stream::iter(ranges)
            .map(|range| async move {
                // The ETag pins every range to the object version seen by HeadObject
                let output = self
                    .client
                    .get_object()
                    .bucket(bucket)
                    .key(key)
                    .range(format!("bytes={}-{}", range.start, range.end - 1))
                    .set_if_match(etag.map(ToString::to_string))
                    .send()
                    .await?;

                if let Some(content_range) = output.content_range() {
                    check_content_range(bucket, key, content_range, &range, len)?;
                }
                let body = output.body.collect().await?.into_bytes();
                check_length(bucket, key, body.len(), range.len())?;

                Ok::<_, ProviderError>(body)
            })
            .buffered(self.options.concurrency)
            .try_collect::<Vec<_>>()
            .await?;

        let mut buffer = BytesMut::with_capacity(len);
        for part in parts {
            buffer.extend_from_slice(&part);
        }
        check_length(bucket, key, buffer.len(), len)?;

        Ok(buffer.freeze())
    }
}
