//! Provider error type and its classification

use aws_sdk_s3::{
    config::http::HttpResponse,
    error::{DisplayErrorContext, ProvideErrorMetadata, SdkError},
    primitives::ByteStreamError,
};
use thiserror::Error;

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Coarse classification of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The bucket or object does not exist
    NotFound,
    /// The provider answered with a 5xx status
    Upstream,
    /// Any other failure (permissions, transport, malformed request, ...)
    Other,
}

/// Error returned by an [`ObjectStoreClient`](super::ObjectStoreClient)
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct ProviderError {
    kind: ProviderErrorKind,
    code: Option<String>,
    message: String,
}

/// Error codes S3 uses for missing buckets and objects
const NOT_FOUND_CODES: [&str; 3] = ["NotFound", "NoSuchBucket", "NoSuchKey"];

impl ProviderError {
    /// Creates a provider error from its parts
    #[must_use]
    pub fn new(kind: ProviderErrorKind, code: Option<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code,
            message: message.into(),
        }
    }

    /// Creates a not-found error with the given provider code
    #[must_use]
    pub fn not_found(code: &str, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::NotFound, Some(code.to_string()), message)
    }

    /// Creates an unclassified error with the given provider code
    #[must_use]
    pub fn other(code: &str, message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, Some(code.to_string()), message)
    }

    /// Classifies a failure from its HTTP status and provider error code
    #[must_use]
    pub fn classify(status: Option<u16>, code: Option<&str>) -> ProviderErrorKind {
        if status == Some(404) || code.is_some_and(|c| NOT_FOUND_CODES.contains(&c)) {
            ProviderErrorKind::NotFound
        } else if status.is_some_and(|s| s >= 500) {
            ProviderErrorKind::Upstream
        } else {
            ProviderErrorKind::Other
        }
    }

    /// Returns the classification of this error
    #[must_use]
    pub const fn kind(&self) -> ProviderErrorKind {
        self.kind
    }

    /// Returns the provider error code, when the provider sent one
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// Checks if the bucket or object did not exist
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.kind == ProviderErrorKind::NotFound
    }

    /// Checks if this error represents an upstream (5xx) error
    #[must_use]
    pub fn is_upstream(&self) -> bool {
        self.kind == ProviderErrorKind::Upstream
    }
}

impl<E> From<SdkError<E, HttpResponse>> for ProviderError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
{
    fn from(error: SdkError<E, HttpResponse>) -> Self {
        let status = error.raw_response().map(|raw| raw.status().as_u16());
        let code = error.code().map(ToString::to_string);
        let kind = Self::classify(status, code.as_deref());

        Self {
            kind,
            code,
            message: DisplayErrorContext(&error).to_string(),
        }
    }
}

impl From<ByteStreamError> for ProviderError {
    fn from(error: ByteStreamError) -> Self {
        Self::new(
            ProviderErrorKind::Other,
            None,
            format!("failed to read object body: {}", DisplayErrorContext(&error)),
        )
    }
}
