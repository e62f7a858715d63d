//! Error types for file storage operations

use thiserror::Error;

use crate::config::ConfigError;
use crate::provider::ProviderError;

/// Result type for file storage operations
pub type FileStorageResult<T> = Result<T, FileStorageError>;

/// Errors that can occur during file storage operations
#[derive(Error, Debug)]
pub enum FileStorageError {
    /// A precondition on the arguments was violated; no request was sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The provider call failed
    #[error("{operation} failed ({context})")]
    Provider {
        /// Name of the failed operation
        operation: &'static str,
        /// Arguments of the failed call, such as bucket and region
        context: String,
        /// Underlying provider error
        #[source]
        source: ProviderError,
    },

    /// The provider reported success but broke a post-condition
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// The batch delete succeeded but did not confirm one of the requested keys
    #[error("file \"{key}\" was not deleted from bucket {bucket}")]
    PartialDelete {
        /// Bucket the batch was sent to
        bucket: String,
        /// First requested key missing from the deleted set
        key: String,
    },

    /// The configuration failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl FileStorageError {
    pub(crate) fn provider(
        operation: &'static str,
        context: impl Into<String>,
        source: ProviderError,
    ) -> Self {
        Self::Provider {
            operation,
            context: context.into(),
            source,
        }
    }

    /// Checks if the provider reported the bucket or object as missing
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Provider { source, .. } if source.is_not_found())
    }

    /// Checks if this error represents an upstream (5xx) error
    #[must_use]
    pub fn is_upstream_error(&self) -> bool {
        matches!(self, Self::Provider { source, .. } if source.is_upstream())
    }
}
