//! S3-compatible file storage
//!
//! This crate provides a small file and bucket interface over an S3-compatible provider:
//! listing, chunked upload, ranged download, batch delete and bucket lifecycle operations.

#![deny(clippy::all, clippy::pedantic, clippy::nursery, dead_code)]
#![warn(missing_docs)]

/// Storage configuration
pub mod config;
/// File storage facade
pub mod files;
/// Object store capability and its implementations
pub mod provider;

pub use config::{ConfigError, StorageConfig};
pub use files::{FileStorage, FileStorageError, FileStorageResult};
pub use provider::{BucketInfo, ObjectStoreClient, ProviderError, ProviderErrorKind};
