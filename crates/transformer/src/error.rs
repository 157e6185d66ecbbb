//! Error types for the transformer

use std::time::Duration;
use thiserror::Error;

/// Result type alias for transformer operations
pub type Result<T> = std::result::Result<T, TransformerError>;

/// Transformer errors
#[derive(Error, Debug)]
pub enum TransformerError {
    /// Reference matches none of the supported bucket/key forms
    #[error("Invalid image reference {reference:?}: {reason}")]
    InvalidReference {
        /// The reference as supplied
        reference: String,
        /// Why it was rejected
        reason: String,
    },

    /// Unsupported option value passed to a builder call
    #[error("Invalid argument: {0}")]
    Argument(String),

    /// Operation requires state that has not been set yet
    #[error("Invalid state: {0}")]
    State(String),

    /// Transport failure while reading the origin image
    #[error("Failed to fetch {url}: {reason}")]
    Fetch {
        /// URL that was requested
        url: String,
        /// Transport error message
        reason: String,
    },

    /// Origin answered with a non-success status
    #[error("Fetching {url} returned HTTP {status}")]
    HttpStatus {
        /// URL that was requested
        url: String,
        /// HTTP status code
        status: u16,
    },

    /// Origin did not answer within the configured timeout
    #[error("Fetching {url} timed out after {after:?}")]
    Timeout {
        /// URL that was requested
        url: String,
        /// Configured timeout
        after: Duration,
    },

    /// Header bytes could not be read as a known image format
    #[error("Unsupported image format at {url}: {reason}")]
    UnsupportedFormat {
        /// URL the bytes came from
        url: String,
        /// Parser error message
        reason: String,
    },

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Input to [`UrlEncoder::decode`](crate::UrlEncoder::decode) is not an encoded variant URL
    #[error("Invalid variant payload: {0}")]
    InvalidPayload(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing environment variable
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

// Callers waiting on one origin fetch each receive a copy of its failure.
impl Clone for TransformerError {
    fn clone(&self) -> Self {
        match self {
            Self::InvalidReference { reference, reason } => Self::InvalidReference {
                reference: reference.clone(),
                reason: reason.clone(),
            },
            Self::Argument(msg) => Self::Argument(msg.clone()),
            Self::State(msg) => Self::State(msg.clone()),
            Self::Fetch { url, reason } => Self::Fetch {
                url: url.clone(),
                reason: reason.clone(),
            },
            Self::HttpStatus { url, status } => Self::HttpStatus {
                url: url.clone(),
                status: *status,
            },
            Self::Timeout { url, after } => Self::Timeout {
                url: url.clone(),
                after: *after,
            },
            Self::UnsupportedFormat { url, reason } => Self::UnsupportedFormat {
                url: url.clone(),
                reason: reason.clone(),
            },
            Self::Json(err) => Self::Json(<serde_json::Error as serde::de::Error>::custom(err)),
            Self::InvalidPayload(msg) => Self::InvalidPayload(msg.clone()),
            Self::Config(msg) => Self::Config(msg.clone()),
            Self::MissingEnvVar(var) => Self::MissingEnvVar(var.clone()),
        }
    }
}

impl TransformerError {
    /// Create an invalid reference error
    pub fn invalid_reference(reference: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidReference {
            reference: reference.into(),
            reason: reason.into(),
        }
    }

    /// Create an argument error
    pub fn argument(msg: impl Into<String>) -> Self {
        Self::Argument(msg.into())
    }

    /// Create a state error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a missing env var error
    pub fn missing_env(var: impl Into<String>) -> Self {
        Self::MissingEnvVar(var.into())
    }

    /// Classify a reqwest failure against `url`
    pub(crate) fn from_request(url: &str, err: &reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                url: url.to_string(),
                after: timeout,
            };
        }
        if let Some(status) = err.status() {
            return Self::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            };
        }
        Self::Fetch {
            url: url.to_string(),
            reason: err.to_string(),
        }
    }

    /// Check if this error came from reading the origin image
    #[must_use]
    pub fn is_fetch_error(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::HttpStatus { .. } | Self::Timeout { .. }
        )
    }

    /// Check if retrying `generate` may succeed
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Fetch { .. } | Self::Timeout { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            Self::InvalidReference { .. }
            | Self::Argument(_)
            | Self::State(_)
            | Self::UnsupportedFormat { .. }
            | Self::Json(_)
            | Self::InvalidPayload(_)
            | Self::Config(_)
            | Self::MissingEnvVar(_) => false,
        }
    }

    /// Check if the caller misused the builder rather than the origin failing
    #[must_use]
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidReference { .. } | Self::Argument(_) | Self::State(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_classification() {
        let err = TransformerError::HttpStatus {
            url: "https://s3.amazonaws.com/b/k.jpg".into(),
            status: 503,
        };
        assert!(err.is_fetch_error());
        assert!(err.is_retryable());
        assert!(!err.is_caller_error());

        let not_found = TransformerError::HttpStatus {
            url: "https://s3.amazonaws.com/b/k.jpg".into(),
            status: 404,
        };
        assert!(!not_found.is_retryable());
    }

    #[test]
    fn test_caller_errors_are_not_retryable() {
        let err = TransformerError::argument("unsupported resizer mode \"invalid\"");
        assert!(err.is_caller_error());
        assert!(!err.is_retryable());
        assert!(!err.is_fetch_error());
        assert_eq!(
            err.to_string(),
            "Invalid argument: unsupported resizer mode \"invalid\""
        );
    }

    #[test]
    fn test_clone_keeps_variant_and_message() {
        let err = TransformerError::Timeout {
            url: "https://s3.amazonaws.com/b/k.jpg".into(),
            after: Duration::from_secs(10),
        };
        let copy = err.clone();
        assert!(matches!(copy, TransformerError::Timeout { .. }));
        assert_eq!(copy.to_string(), err.to_string());

        let json: TransformerError = serde_json::from_str::<u8>("x").unwrap_err().into();
        assert!(matches!(json.clone(), TransformerError::Json(_)));
    }

    #[test]
    fn test_invalid_reference_message() {
        let err = TransformerError::invalid_reference("https://example.com/a.png", "unsupported host");
        assert_eq!(
            err.to_string(),
            "Invalid image reference \"https://example.com/a.png\": unsupported host"
        );
    }
}
