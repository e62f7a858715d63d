//! Storage configuration loaded from the environment

use std::env;
use std::fmt;

use thiserror::Error;
use validator::{Validate, ValidationErrors};

/// Environment variable holding the access key id
pub const ACCESS_ID_VAR: &str = "S3_ACCESS_ID";
/// Environment variable holding the secret access key
pub const SECRET_KEY_VAR: &str = "S3_SECRET_KEY";
/// Environment variable holding the optional session token
pub const TOKEN_VAR: &str = "S3_TOKEN";
/// Environment variable holding the region
pub const REGION_VAR: &str = "S3_REGION";
/// Environment variable holding the optional custom endpoint URL
pub const ENDPOINT_VAR: &str = "S3_ENDPOINT";

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or validating the configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("{0} environment variable not set")]
    MissingVar(&'static str),

    /// A field failed validation
    #[error("Invalid storage configuration: {0}")]
    Invalid(#[from] ValidationErrors),
}

/// Credentials and endpoint of an S3-compatible provider
#[derive(Clone, PartialEq, Eq, Validate)]
pub struct StorageConfig {
    /// Access key id
    #[validate(length(min = 1, message = "access id is required"))]
    pub access_id: String,
    /// Secret access key
    #[validate(length(min = 1, message = "secret key is required"))]
    pub secret_key: String,
    /// Optional session token
    pub token: Option<String>,
    /// Region the client signs for and buckets are created in
    #[validate(length(min = 1, message = "region is required"))]
    pub region: String,
    /// Custom endpoint URL for S3-compatible providers
    #[validate(url(message = "endpoint must be a valid URL"))]
    pub endpoint: Option<String>,
}

impl fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageConfig")
            .field("access_id", &self.access_id)
            .field("secret_key", &"<redacted>")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn required_var(name: &'static str) -> ConfigResult<String> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

impl StorageConfig {
    /// Loads the configuration from `S3_*` environment variables and validates it
    ///
    /// Empty optional variables are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingVar` if a required variable is not set
    /// Returns `ConfigError::Invalid` if a field fails validation
    pub fn from_env() -> ConfigResult<Self> {
        let config = Self {
            access_id: required_var(ACCESS_ID_VAR)?,
            secret_key: required_var(SECRET_KEY_VAR)?,
            token: optional_var(TOKEN_VAR),
            region: required_var(REGION_VAR)?,
            endpoint: optional_var(ENDPOINT_VAR),
        };
        config.validated()
    }

    /// Validates the configuration, returning it unchanged on success
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a required field is empty or the endpoint is not a URL
    pub fn validated(self) -> ConfigResult<Self> {
        self.validate()?;
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn config() -> StorageConfig {
        StorageConfig {
            access_id: "access".to_string(),
            secret_key: "secret".to_string(),
            token: None,
            region: "ru-1".to_string(),
            endpoint: Some("https://s3.storage.example.com".to_string()),
        }
    }

    fn clear_env() {
        for var in [ACCESS_ID_VAR, SECRET_KEY_VAR, TOKEN_VAR, REGION_VAR, ENDPOINT_VAR] {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(config().validated().is_ok());
    }

    #[test]
    fn test_required_fields_must_not_be_empty() {
        let cases = [
            StorageConfig {
                access_id: String::new(),
                ..config()
            },
            StorageConfig {
                secret_key: String::new(),
                ..config()
            },
            StorageConfig {
                region: String::new(),
                ..config()
            },
        ];

        for case in cases {
            assert!(matches!(case.validated(), Err(ConfigError::Invalid(_))));
        }
    }

    #[test]
    fn test_endpoint_must_be_url() {
        let invalid = StorageConfig {
            endpoint: Some("not a url".to_string()),
            ..config()
        };
        assert!(matches!(invalid.validated(), Err(ConfigError::Invalid(_))));

        let absent = StorageConfig {
            endpoint: None,
            ..config()
        };
        assert!(absent.validated().is_ok());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = StorageConfig {
            token: Some("session".to_string()),
            ..config()
        };
        let debug = format!("{config:?}");

        assert!(!debug.contains("secret\""));
        assert!(!debug.contains("session"));
        assert!(debug.contains("access"));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        env::set_var(ACCESS_ID_VAR, "access");
        env::set_var(SECRET_KEY_VAR, "secret");
        env::set_var(REGION_VAR, "ru-1");
        env::set_var(TOKEN_VAR, "");
        env::set_var(ENDPOINT_VAR, "http://localhost:4566");

        let config = StorageConfig::from_env().unwrap();
        assert_eq!(config.token, None);
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.region, "ru-1");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_missing_region() {
        clear_env();
        env::set_var(ACCESS_ID_VAR, "access");
        env::set_var(SECRET_KEY_VAR, "secret");

        assert!(matches!(
            StorageConfig::from_env(),
            Err(ConfigError::MissingVar(REGION_VAR))
        ));

        clear_env();
    }
}
