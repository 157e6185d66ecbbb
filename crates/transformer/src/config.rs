//! Configuration for the image transformer
//!
//! Supports environment-based configuration with sensible defaults.

use crate::error::{Result, TransformerError};
use crate::metadata::Metadata;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Bucket assumed for bare object keys
pub const DEFAULT_BUCKET: &str = "media.listamax.com";

/// Placeholder output domain used by [`TransformerConfig::default`]
const DEFAULT_BASE_DOMAIN: &str = "https://images.example.com";

/// Bytes requested by the first, ranged read of an origin image
pub const DEFAULT_HEADER_BYTES: usize = 64 * 1024;

/// Output domain variable
pub const DOMAIN_ENV: &str = "IMAGE_TRANSFORMER_DOMAIN";
/// Default bucket variable
pub const BUCKET_ENV: &str = "IMAGE_TRANSFORMER_BUCKET";
/// Fetch timeout variable, in seconds
pub const TIMEOUT_ENV: &str = "IMAGE_TRANSFORMER_TIMEOUT_SECS";
/// Ranged read size variable
pub const HEADER_BYTES_ENV: &str = "IMAGE_TRANSFORMER_HEADER_BYTES";

/// Transformer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformerConfig {
    /// Domain the encoded payload is appended to
    pub base_domain: String,
    /// Bucket for references that are bare keys
    pub default_bucket: String,
    /// Timeout bounding each origin fetch
    #[serde(with = "duration_secs")]
    pub fetch_timeout: Duration,
    /// Size of the ranged header read
    pub header_bytes: usize,
    /// User agent sent to the origin
    pub user_agent: String,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for TransformerConfig {
    fn default() -> Self {
        Self {
            base_domain: DEFAULT_BASE_DOMAIN.to_string(),
            default_bucket: DEFAULT_BUCKET.to_string(),
            fetch_timeout: Duration::from_secs(10),
            header_bytes: DEFAULT_HEADER_BYTES,
            user_agent: concat!("gfr-image-transformer/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TransformerConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `IMAGE_TRANSFORMER_DOMAIN`: output domain (required)
    /// - `IMAGE_TRANSFORMER_BUCKET`: bucket for bare keys
    /// - `IMAGE_TRANSFORMER_TIMEOUT_SECS`: origin fetch timeout in seconds
    /// - `IMAGE_TRANSFORMER_HEADER_BYTES`: size of the ranged header read
    pub fn from_env() -> Result<Self> {
        let base_domain = env::var(DOMAIN_ENV).map_err(|_| TransformerError::missing_env(DOMAIN_ENV))?;

        let defaults = Self::default();

        let default_bucket = env::var(BUCKET_ENV).unwrap_or(defaults.default_bucket);

        let fetch_timeout = match env::var(TIMEOUT_ENV) {
            Ok(raw) => raw
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| TransformerError::config(format!("{TIMEOUT_ENV} must be whole seconds, got {raw:?}")))?,
            Err(_) => defaults.fetch_timeout,
        };

        let header_bytes = match env::var(HEADER_BYTES_ENV) {
            Ok(raw) => raw
                .parse()
                .map_err(|_| TransformerError::config(format!("{HEADER_BYTES_ENV} must be a byte count, got {raw:?}")))?,
            Err(_) => defaults.header_bytes,
        };

        let config = Self {
            base_domain,
            default_bucket,
            fetch_timeout,
            header_bytes,
            user_agent: defaults.user_agent,
        };
        config.validate()?;
        Ok(config)
    }

    /// Builder-style method to set the output domain
    #[must_use]
    pub fn with_base_domain(mut self, domain: impl Into<String>) -> Self {
        self.base_domain = domain.into();
        self
    }

    /// Builder-style method to set the default bucket
    #[must_use]
    pub fn with_default_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.default_bucket = bucket.into();
        self
    }

    /// Builder-style method to set the fetch timeout
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Builder-style method to set the ranged read size
    #[must_use]
    pub fn with_header_bytes(mut self, bytes: usize) -> Self {
        self.header_bytes = bytes;
        self
    }

    /// Builder-style method to set the user agent
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Parse `reference` using this configuration's default bucket
    pub fn metadata(&self, reference: impl Into<String>) -> Result<Metadata> {
        Metadata::with_default_bucket(reference, &self.default_bucket)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.base_domain.is_empty() {
            return Err(TransformerError::config("base_domain cannot be empty"));
        }

        if !self.base_domain.starts_with("http://") && !self.base_domain.starts_with("https://") {
            return Err(TransformerError::config("base_domain must start with http:// or https://"));
        }

        if self.default_bucket.is_empty() {
            return Err(TransformerError::config("default_bucket cannot be empty"));
        }

        if self.fetch_timeout.is_zero() {
            return Err(TransformerError::config("fetch_timeout cannot be zero"));
        }

        if self.header_bytes < gfr_image::MIN_HEADER_BYTES {
            return Err(TransformerError::config(format!(
                "header_bytes must be at least {}",
                gfr_image::MIN_HEADER_BYTES
            )));
        }

        Ok(())
    }
}
