//! Typed errors for rewrite requests
//!
//! Lets callers tell transport failure modes apart without string matching.
//! Every variant leaves the session untouched; the controller wraps them in
//! a generic user-facing failure.

use thiserror::Error;

/// Rewrite service errors with typed variants
///
/// - `BadRequest` (400) - the service rejected the payload; do not retry
/// - `RateLimited` (429) - retry after a delay
/// - `ServiceError` (5xx) - server-side issue; can retry
/// - `Network` - connection refused or timed out; can retry
/// - `Malformed` - 2xx with a body missing `revised` or `threadId`
/// - `Other` - anything else, including unexpected statuses
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Service error: {0}")]
    ServiceError(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The service answered but the body is unusable
    #[error("Malformed response: {0}")]
    Malformed(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl RewriteError {
    /// Check if retrying the same request later could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RewriteError::RateLimited(_) | RewriteError::ServiceError(_) | RewriteError::Network(_)
        )
    }

    /// Convert a non-success HTTP status and body text into a typed error
    pub fn from_http_status(status: reqwest::StatusCode, error_text: String) -> Self {
        match status.as_u16() {
            400 => RewriteError::BadRequest(error_text),
            429 => RewriteError::RateLimited(error_text),
            500..=599 => RewriteError::ServiceError(error_text),
            _ => RewriteError::Other(anyhow::anyhow!("HTTP {}: {}", status, error_text)),
        }
    }

    /// Convert network/connection errors into a typed error
    pub fn from_network_error(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            RewriteError::Network(format!("Request timeout: {}", e))
        } else if e.is_connect() {
            RewriteError::Network(format!("Connection failed: {}", e))
        } else if e.is_decode() {
            RewriteError::Malformed(e.to_string())
        } else if let Some(status) = e.status() {
            Self::from_http_status(status, e.to_string())
        } else {
            RewriteError::Other(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_http_status() {
        let err = RewriteError::from_http_status(
            reqwest::StatusCode::BAD_REQUEST,
            "missing text".to_string(),
        );
        assert!(matches!(err, RewriteError::BadRequest(_)));
        assert!(!err.is_retryable());

        let err = RewriteError::from_http_status(
            reqwest::StatusCode::TOO_MANY_REQUESTS,
            "slow down".to_string(),
        );
        assert!(matches!(err, RewriteError::RateLimited(_)));
        assert!(err.is_retryable());

        let err = RewriteError::from_http_status(
            reqwest::StatusCode::BAD_GATEWAY,
            "upstream".to_string(),
        );
        assert!(matches!(err, RewriteError::ServiceError(_)));

        let err =
            RewriteError::from_http_status(reqwest::StatusCode::NOT_FOUND, "no route".to_string());
        assert!(matches!(err, RewriteError::Other(_)));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_malformed_not_retryable() {
        let err = RewriteError::Malformed("missing threadId".to_string());
        assert!(!err.is_retryable());
        assert_eq!(err.to_string(), "Malformed response: missing threadId");
    }
}
