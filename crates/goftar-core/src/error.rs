//! Error types for the Goftar Core Bridge.

use thiserror::Error;

/// Result type alias using the bridge's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for bridge operations.
///
/// The bridge never retries an operation on its own and never swallows an
/// error: recoverable failures (`StoreUnavailable`, `Upstream`, `Timeout`,
/// `StreamInterrupted`) are surfaced so callers control retry and backoff.
#[derive(Error, Debug)]
pub enum Error {
    /// Fatal startup misconfiguration (missing signing key, bucket cannot
    /// be verified). The process must not serve traffic.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller input rejected before any network call. No side effects.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Object store unreachable mid-operation.
    #[error("Object store unavailable: {0}")]
    StoreUnavailable(String),

    /// Non-2xx response from the Core service. 5xx is retryable by the
    /// caller, 4xx is terminal.
    #[error("Upstream returned {status}: {body}")]
    Upstream { status: u16, body: String },

    /// A buffered query exceeded its deadline. Never carries partial data.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// The upstream stream dropped before its end marker.
    #[error("Stream interrupted: {0}")]
    StreamInterrupted(String),

    /// Resource not found (stale object key, missing record). Terminal for
    /// that operation only.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// HTTP/network request failed below the status-code level
    #[error("Request error: {0}")]
    Request(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}

impl Error {
    /// Whether a caller may reasonably retry the failed operation.
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::StoreUnavailable(_)
            | Error::Timeout(_)
            | Error::StreamInterrupted(_)
            | Error::Request(_) => true,
            Error::Upstream { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing signing secret".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: missing signing secret"
        );
    }

    #[test]
    fn test_error_display_validation() {
        let err = Error::Validation("too many attachments".to_string());
        assert_eq!(err.to_string(), "Validation error: too many attachments");
    }

    #[test]
    fn test_error_display_upstream() {
        let err = Error::Upstream {
            status: 503,
            body: "overloaded".to_string(),
        };
        assert_eq!(err.to_string(), "Upstream returned 503: overloaded");
    }

    #[test]
    fn test_error_display_stream_interrupted() {
        let err = Error::StreamInterrupted("connection reset".to_string());
        assert_eq!(err.to_string(), "Stream interrupted: connection reset");
    }

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("staging/abc".to_string());
        assert_eq!(err.to_string(), "Not found: staging/abc");
    }

    #[test]
    fn test_retryable_matrix() {
        assert!(Error::StoreUnavailable("down".into()).is_retryable());
        assert!(Error::Timeout("deadline".into()).is_retryable());
        assert!(Error::StreamInterrupted("eof".into()).is_retryable());
        assert!(Error::Upstream {
            status: 500,
            body: String::new()
        }
        .is_retryable());
        assert!(!Error::Upstream {
            status: 422,
            body: String::new()
        }
        .is_retryable());
        assert!(!Error::Validation("bad".into()).is_retryable());
        assert!(!Error::NotFound("gone".into()).is_retryable());
        assert!(!Error::Config("boot".into()).is_retryable());
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        match err {
            Error::Serialization(msg) => assert!(!msg.is_empty()),
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}
