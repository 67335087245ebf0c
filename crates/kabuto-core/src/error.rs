//! Error types for the relay core.

use thiserror::Error;

/// Errors raised while loading configuration at startup.
///
/// These are fatal: the binary refuses to start.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is absent or empty.
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    /// A variable is present but cannot be parsed.
    #[error("invalid value for {name}: {message}")]
    Invalid {
        /// Name of the variable.
        name: &'static str,
        /// What was wrong with it.
        message: String,
    },
}

/// Errors from outbound API calls (completion or channel send).
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request did not complete before the client timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Connection-level failure (DNS, refused, reset).
    #[error("network error: {0}")]
    Network(String),

    /// The remote API answered with a non-success status.
    #[error("API returned status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, as far as it could be read.
        body: String,
    },

    /// The response could not be understood.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The channel refused the message (bad recipient, blocked bot, ...).
    #[error("send rejected: {0}")]
    Rejected(String),
}

impl ApiError {
    /// Returns true if repeating the call could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Timeout(_) | ApiError::Network(_) => true,
            ApiError::Status { status, .. } => *status == 429 || *status >= 500,
            ApiError::Malformed(_) | ApiError::Rejected(_) => false,
        }
    }

    /// Returns true for failures below the HTTP layer.
    ///
    /// Only these qualify for the immediate completion retry.
    pub fn is_transient_network(&self) -> bool {
        matches!(self, ApiError::Timeout(_) | ApiError::Network(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout(err.to_string())
        } else if err.is_decode() {
            ApiError::Malformed(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::Status {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

/// Result type for API operations.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(ApiError::Timeout("t".into()).is_retryable());
        assert!(ApiError::Network("refused".into()).is_retryable());
        assert!(ApiError::Status { status: 429, body: String::new() }.is_retryable());
        assert!(ApiError::Status { status: 503, body: String::new() }.is_retryable());
        assert!(!ApiError::Status { status: 401, body: String::new() }.is_retryable());
        assert!(!ApiError::Status { status: 400, body: String::new() }.is_retryable());
        assert!(!ApiError::Malformed("no choices".into()).is_retryable());
        assert!(!ApiError::Rejected("chat not found".into()).is_retryable());
    }

    #[test]
    fn test_transient_network_excludes_status() {
        assert!(ApiError::Network("reset".into()).is_transient_network());
        assert!(!ApiError::Status { status: 503, body: String::new() }.is_transient_network());
    }

    #[test]
    fn test_error_display() {
        let err = ConfigError::Missing("OPENAI_API_KEY");
        assert_eq!(
            err.to_string(),
            "missing required environment variable OPENAI_API_KEY"
        );

        let err = ApiError::Status {
            status: 401,
            body: "invalid key".into(),
        };
        assert_eq!(err.to_string(), "API returned status 401: invalid key");
    }
}
