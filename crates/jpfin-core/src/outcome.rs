//! Per-task fetch outcome

use serde::{Deserialize, Serialize};

use crate::capability::SourceData;
use crate::error::{FailureKind, TaskError};

/// Result of executing one fetch task
///
/// Exactly one variant holds: a payload and an error never coexist, and a
/// source that was not attempted (`Skipped`) is distinguishable from one that
/// was attempted and found nothing (`Empty`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    /// The call succeeded with data
    Success { data: SourceData },
    /// The call succeeded but nothing matched
    Empty,
    /// The adapter is unavailable; nothing was invoked
    Skipped { reason: String },
    /// The call was attempted and failed or timed out
    Failed { kind: FailureKind, message: String },
}

impl FetchOutcome {
    pub fn success(data: SourceData) -> Self {
        FetchOutcome::Success { data }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        FetchOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        FetchOutcome::Failed {
            kind,
            message: message.into(),
        }
    }

    /// Status tag, as serialized
    pub fn status(&self) -> &'static str {
        match self {
            FetchOutcome::Success { .. } => "success",
            FetchOutcome::Empty => "empty",
            FetchOutcome::Skipped { .. } => "skipped",
            FetchOutcome::Failed { .. } => "failed",
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Success { .. })
    }

    pub fn data(&self) -> Option<&SourceData> {
        match self {
            FetchOutcome::Success { data } => Some(data),
            _ => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            FetchOutcome::Failed { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<Result<Option<SourceData>, TaskError>> for FetchOutcome {
    fn from(result: Result<Option<SourceData>, TaskError>) -> Self {
        match result {
            Ok(Some(data)) => FetchOutcome::Success { data },
            Ok(None) => FetchOutcome::Empty,
            Err(TaskError { kind, message }) => FetchOutcome::Failed { kind, message },
        }
    }
}
