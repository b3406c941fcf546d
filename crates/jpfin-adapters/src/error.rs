//! Error types for data source clients

use jpfin_core::AdapterError;
use thiserror::Error;

/// Data source client errors
#[derive(Debug, Error)]
pub enum SourceError {
    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid request URL
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The service answered with a non-success status
    #[error("{service} API error {status}: {body}")]
    Api {
        service: &'static str,
        status: u16,
        body: String,
    },

    /// The service reported an error inside a successful response
    #[error("{service} error: {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    /// Response did not have the expected shape
    #[error("Unexpected {service} response: {message}")]
    Format {
        service: &'static str,
        message: String,
    },

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {0}")]
    RateLimited(&'static str),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinance(String),

    /// Invalid argument passed to a client
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SourceError {
    pub(crate) fn format(service: &'static str, message: impl Into<String>) -> Self {
        SourceError::Format {
            service,
            message: message.into(),
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            SourceError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            SourceError::Api { status, .. } => *status >= 500,
            SourceError::RateLimited(_) => true,
            _ => false,
        }
    }
}

/// Result type alias for source clients
pub type Result<T> = std::result::Result<T, SourceError>;

/// Convert SourceError to the core adapter error
impl From<SourceError> for AdapterError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Network(e) => AdapterError::Network(e.to_string()),
            SourceError::Api {
                service,
                status,
                body,
            } => AdapterError::Remote {
                service: service.to_string(),
                status,
                message: body,
            },
            SourceError::Service { service, message } => AdapterError::Remote {
                service: service.to_string(),
                status: 200,
                message,
            },
            SourceError::RateLimited(service) => AdapterError::RateLimited(service.to_string()),
            err @ (SourceError::Json(_) | SourceError::Format { .. }) => {
                AdapterError::Parse(err.to_string())
            }
            other => AdapterError::Other(other.to_string()),
        }
    }
}
