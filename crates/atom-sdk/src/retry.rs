//! Connection-level retry for idempotent requests

use std::time::Duration;

use crate::transport::TransportError;

/// Retry policy configuration
///
/// Only connection failures are repeated. Timeouts and anything the server
/// actually answered are returned to the caller on the first attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: usize,
    /// Pause between attempts; zero retries immediately
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            delay: Duration::ZERO,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: usize, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Never repeats a request.
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub async fn retry<F, Fut, T>(&self, operation: F) -> Result<T, TransportError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T, TransportError>>,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_connect() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(
                        "Retry attempt {}/{} after error: {}",
                        attempt,
                        self.max_retries,
                        e
                    );
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }
}
