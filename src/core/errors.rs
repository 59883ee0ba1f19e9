//! Domain error types
//!
//! These errors represent business logic failures, distinct from the typed
//! transport failures in [`crate::rewrite::RewriteError`].

use crate::rewrite::RewriteError;
use thiserror::Error;

/// Errors related to session management
#[derive(Debug, Error)]
pub enum SessionError {
    /// Thread not found
    #[error("Thread not found: {0}")]
    ThreadNotFound(String),

    /// Version number outside the thread's range
    #[error("Thread {thread_id} has no version {version}")]
    VersionNotFound { thread_id: String, version: usize },

    /// Invalid session state (bad import, failed export)
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Storage error (wraps infrastructure errors)
    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<anyhow::Error> for SessionError {
    fn from(err: anyhow::Error) -> Self {
        SessionError::Storage(err.to_string())
    }
}

/// Errors surfaced by a rewrite submission
///
/// The display text is deliberately generic; the typed cause stays reachable
/// through `source()` for logging.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// The rewrite service could not produce a revision
    #[error("Sorry, there was an error. Please try again.")]
    RewriteFailed(#[source] RewriteError),

    /// The referenced thread or version does not exist
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl SubmitError {
    /// Underlying rewrite failure, if this was one
    pub fn rewrite_error(&self) -> Option<&RewriteError> {
        match self {
            SubmitError::RewriteFailed(err) => Some(err),
            SubmitError::Session(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_submit_error_is_generic() {
        let err = SubmitError::RewriteFailed(RewriteError::ServiceError("boom".to_string()));
        assert_eq!(err.to_string(), "Sorry, there was an error. Please try again.");
        assert!(err.source().is_some());
        assert!(matches!(
            err.rewrite_error(),
            Some(RewriteError::ServiceError(_))
        ));
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::VersionNotFound {
            thread_id: "t1".to_string(),
            version: 4,
        };
        assert_eq!(err.to_string(), "Thread t1 has no version 4");

        let err: SessionError = anyhow::anyhow!("disk full").into();
        assert!(matches!(err, SessionError::Storage(_)));
    }
}
