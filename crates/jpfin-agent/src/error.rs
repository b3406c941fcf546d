//! Error types for the compound operations

use thiserror::Error;

/// Errors raised synchronously by the agent
///
/// Everything that goes wrong after validation is reported per source inside
/// the aggregated result instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AgentError {
    /// Malformed caller input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid agent configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl AgentError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        AgentError::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AgentError::Validation(_))
    }
}

/// Result type alias for agent operations
pub type Result<T> = std::result::Result<T, AgentError>;
