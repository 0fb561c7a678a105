//! Runtime error types.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by a generation runtime.
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// HTTP error from the inference server.
    #[error("HTTP error: {status} - {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Response body.
        body: String,
    },

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// Request timeout.
    #[error("Request timeout after {0:?}")]
    Timeout(Duration),

    /// The produced text does not satisfy the requested constraint.
    #[error("Produced text {produced:?} violates constraint {constraint}")]
    ConstraintViolation {
        /// Rendered constraint.
        constraint: String,
        /// Text the runtime produced.
        produced: String,
    },

    /// The constraint's pattern does not compile.
    #[error("Invalid constraint {constraint}: {reason}")]
    InvalidConstraint {
        /// Rendered constraint.
        constraint: String,
        /// Regex compile error.
        reason: String,
    },

    /// A scripted runtime ran out of responses.
    #[error("No scripted response left for request #{0}")]
    Exhausted(usize),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RuntimeError {
    /// Check if this error is retryable.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            RuntimeError::Timeout(_) => true,
            RuntimeError::Connection(_) => true,
            RuntimeError::Http { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Create an HTTP error.
    pub fn http(status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            status,
            body: body.into(),
        }
    }

    /// Create an invalid constraint error.
    pub fn invalid_constraint(constraint: impl ToString, reason: impl ToString) -> Self {
        Self::InvalidConstraint {
            constraint: constraint.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a constraint violation error.
    pub fn constraint_violation(constraint: impl ToString, produced: impl Into<String>) -> Self {
        Self::ConstraintViolation {
            constraint: constraint.to_string(),
            produced: produced.into(),
        }
    }
}

impl From<reqwest::Error> for RuntimeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RuntimeError::Timeout(Duration::from_secs(30))
        } else if err.is_connect() {
            RuntimeError::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            RuntimeError::Http {
                status: status.as_u16(),
                body: err.to_string(),
            }
        } else {
            RuntimeError::Other(err.into())
        }
    }
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(RuntimeError::Timeout(Duration::from_secs(30)), true)]
    #[case(RuntimeError::Connection("refused".into()), true)]
    #[case(RuntimeError::http(503, "loading model"), true)]
    #[case(RuntimeError::http(400, "bad grammar"), false)]
    #[case(RuntimeError::Exhausted(3), false)]
    #[case(RuntimeError::constraint_violation("one of [\"a\"]", "b"), false)]
    #[case(RuntimeError::from(serde_json::from_str::<u8>("x").unwrap_err()), false)]
    fn test_is_retryable(#[case] err: RuntimeError, #[case] retryable: bool) {
        assert_eq!(err.is_retryable(), retryable);
    }

    #[test]
    fn test_error_display() {
        let err = RuntimeError::constraint_violation("one of [\"pear\"]", "Pear");
        assert_eq!(
            err.to_string(),
            "Produced text \"Pear\" violates constraint one of [\"pear\"]"
        );

        let err = RuntimeError::http(404, "Not found");
        assert!(err.to_string().contains("404"));
    }
}
