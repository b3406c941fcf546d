//! Retry logic with exponential backoff
//!
//! Adapters retry transient failures (timeouts, connection errors, 5xx, 429)
//! on their own. The orchestration core never retries.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::{Result, SourceError};

/// Retry policy configuration
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts, including the first
    pub max_attempts: u32,

    /// Initial backoff duration
    pub initial_backoff: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,

    /// Backoff multiplier (typically 2.0 for exponential backoff)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with no retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::from_secs(0),
            max_backoff: Duration::from_secs(0),
            backoff_multiplier: 1.0,
        }
    }

    /// Create a policy with fast retries (for testing)
    pub fn fast() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(100),
            backoff_multiplier: 2.0,
        }
    }

    /// Same policy with a different attempt budget
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Calculate backoff duration for a given attempt
    fn backoff_duration(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_secs(0);
        }

        let backoff_ms = self.initial_backoff.as_millis() as f64
            * self.backoff_multiplier.powi((attempt - 1) as i32);

        Duration::from_millis(backoff_ms as u64).min(self.max_backoff)
    }

    /// Execute an async operation, retrying transient failures
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!("Attempt {}/{} for {}", attempt, max_attempts, operation_name);

            let error = match operation().await {
                Ok(result) => {
                    if attempt > 1 {
                        debug!("{} succeeded after {} retries", operation_name, attempt - 1);
                    }
                    return Ok(result);
                }
                Err(e) => e,
            };

            if !error.is_transient() || attempt >= max_attempts {
                if attempt > 1 {
                    warn!(
                        "{} failed after {} attempts: {}",
                        operation_name, attempt, error
                    );
                }
                return Err(error);
            }

            let backoff = self.backoff_duration(attempt);
            warn!(
                "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                operation_name, attempt, max_attempts, error, backoff
            );
            sleep(backoff).await;
        }
    }
}

/// Treat HTTP 429 as a rate-limit error so it is retried
pub(crate) fn classify_status(service: &'static str, status: u16, body: String) -> SourceError {
    if status == 429 {
        SourceError::RateLimited(service)
    } else {
        SourceError::Api {
            service,
            status,
            body,
        }
    }
}
