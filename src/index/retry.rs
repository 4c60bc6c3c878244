//! Bounded retry with exponential backoff for index requests.
//!
//! Server errors and transport failures are retried; client errors are not.

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Outcome of a single request attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    /// Worth trying again (5xx, timeout, connection failure)
    Transient(String),
    /// Final for this request (4xx, malformed body)
    Permanent(String),
}

impl AttemptError {
    pub fn message(&self) -> &str {
        match self {
            AttemptError::Transient(msg) | AttemptError::Permanent(msg) => msg,
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let message = format!("HTTP {status}: {body}");
        if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            AttemptError::Transient(message)
        } else {
            AttemptError::Permanent(message)
        }
    }

    pub fn from_transport(error: &reqwest::Error) -> Self {
        if error.is_timeout() || error.is_connect() {
            AttemptError::Transient(error.to_string())
        } else {
            AttemptError::Permanent(error.to_string())
        }
    }
}

/// Retry policy shared by all index requests of a client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Duration) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }

    /// Delay before retry number `retry` (1-based): backoff, 2x, 4x, ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.backoff
            .saturating_mul(1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX))
    }

    /// Run `attempt` until it succeeds, fails permanently, or retries run out
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T, AttemptError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let mut retries = 0;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err @ AttemptError::Permanent(_)) => return Err(err),
                Err(err) => {
                    if retries >= self.max_retries {
                        return Err(err);
                    }
                    retries += 1;
                    let delay = self.delay_for(retries);
                    warn!(
                        operation = operation,
                        error = err.message(),
                        retry = retries,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Transient index error, will retry"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }
}
