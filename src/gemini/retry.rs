//! Retry with capped exponential backoff for vendor API calls.

use crate::error::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

/// Retries transient failures with exponential backoff.
///
/// Only errors classified as transient (429, 5xx, transport) are retried;
/// anything else comes back to the caller on the first attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_retries: usize,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            max_retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }

    /// Run an operation, retrying transient failures with backoff.
    pub async fn run<F, Fut, T>(&self, operation: &str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut attempt = 0;
        let mut backoff = self.initial_backoff;

        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        info!("{} succeeded after {} attempt(s)", operation, attempt + 1);
                    }
                    return Ok(value);
                }
                Err(e) => {
                    attempt += 1;
                    if !e.is_transient() || attempt > self.max_retries {
                        return Err(e);
                    }

                    warn!(
                        "{} failed (attempt {}/{}), retrying in {:?}: {}",
                        operation, attempt, self.max_retries, backoff, e
                    );
                    sleep(backoff).await;
                    backoff = std::cmp::min(backoff * 2, self.max_backoff);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SnakkError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn transient() -> SnakkError {
        SnakkError::Gemini("HTTP 503: busy".to_string())
    }

    fn permanent() -> SnakkError {
        SnakkError::Gemini("HTTP 400: bad request".to_string())
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let attempts = AtomicUsize::new(0);
        let policy = RetryPolicy::new(3, 1, 10);

        let result = policy
            .run("op", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(transient())
                    } else {
                        Ok(n)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let attempts = AtomicUsize::new(0);
        let policy = RetryPolicy::new(3, 1, 10);

        let result: Result<()> = policy
            .run("op", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(permanent()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let attempts = AtomicUsize::new(0);
        let policy = RetryPolicy::new(2, 1, 10);

        let result: Result<()> = policy
            .run("op", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err(transient()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }
}
