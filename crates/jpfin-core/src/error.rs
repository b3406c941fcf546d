//! Error types for the aggregation core
//!
//! Three distinct families live here:
//! - [`Unavailable`]: why an adapter slot could not be resolved (recorded as
//!   data in the registry, never raised)
//! - [`AdapterError`]: what an adapter call can fail with
//! - [`TaskError`]: a failure at the task boundary, tagged with the
//!   [`FailureKind`] that ends up in `FetchOutcome::Failed`

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason an adapter slot is unusable for this process
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum Unavailable {
    /// The adapter implementation is not part of this build
    #[error("missing dependency: {0}")]
    MissingDependency(String),

    /// A required credential or identifier is not configured
    #[error("missing credential: {0}")]
    MissingCredential(String),

    /// The adapter could not be constructed
    #[error("initialization failed: {0}")]
    InitializationFailed(String),

    /// The source was switched off by configuration
    #[error("disabled by configuration: {0}")]
    Disabled(String),
}

/// Error raised by an adapter operation
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Transport-level failure (connect, TLS, read)
    #[error("network error: {0}")]
    Network(String),

    /// The remote service answered with an error
    #[error("{service} returned status {status}: {message}")]
    Remote {
        service: String,
        status: u16,
        message: String,
    },

    /// The response could not be understood
    #[error("unexpected response: {0}")]
    Parse(String),

    /// The remote service refused further requests
    #[error("rate limited by {0}")]
    RateLimited(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for adapter operations
pub type AdapterResult<T> = std::result::Result<T, AdapterError>;

/// Failure classification carried by `FetchOutcome::Failed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The call exceeded its time budget
    Timeout,
    /// The adapter raised (network, parsing, or remote-service error)
    UpstreamError,
    /// A lookup step needed by this task failed
    DependencyUnresolved,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::UpstreamError => "upstream_error",
            FailureKind::DependencyUnresolved => "dependency_unresolved",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed task, as seen at the task boundary
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {message}")]
pub struct TaskError {
    pub kind: FailureKind,
    pub message: String,
}

impl TaskError {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Timeout, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(FailureKind::UpstreamError, message)
    }

    pub fn dependency_unresolved(message: impl Into<String>) -> Self {
        Self::new(FailureKind::DependencyUnresolved, message)
    }
}

/// Any adapter error surfacing from a task is an upstream error
impl From<AdapterError> for TaskError {
    fn from(err: AdapterError) -> Self {
        TaskError::upstream(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_display() {
        let reason = Unavailable::MissingCredential("EDINET_API_KEY".to_string());
        assert_eq!(reason.to_string(), "missing credential: EDINET_API_KEY");
    }

    #[test]
    fn test_adapter_error_becomes_upstream() {
        let err = AdapterError::Remote {
            service: "e-Stat".to_string(),
            status: 503,
            message: "maintenance".to_string(),
        };
        let task_err: TaskError = err.into();
        assert_eq!(task_err.kind, FailureKind::UpstreamError);
        assert_eq!(task_err.message, "e-Stat returned status 503: maintenance");
    }

    #[test]
    fn test_failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::DependencyUnresolved).unwrap();
        assert_eq!(json, "\"dependency_unresolved\"");
    }
}
