//! Back-off policy for directory calls.
//!
//! Only transport-level failures are retried. A response the directory
//! actually produced, including one carrying execution errors, is final.

use std::future::Future;
use std::time::Duration;

use crate::error::DirectoryError;

/// Upper bound on a single back-off sleep.
const MAX_DELAY: Duration = Duration::from_secs(4);

/// Fraction of the delay applied as random spread in either direction.
const JITTER: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RetryPolicy {
    /// Attempts after the first one.
    pub(crate) max_retries: u32,
    pub(crate) base_delay: Duration,
}

impl RetryPolicy {
    pub(crate) fn new(max_retries: u32, backoff_base_ms: u64) -> Self {
        Self {
            max_retries,
            base_delay: Duration::from_millis(backoff_base_ms),
        }
    }

    /// Delay before retry number `retry` (1-based), before jitter:
    /// `base * 2^(retry-1)`, capped at [`MAX_DELAY`].
    pub(crate) fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32 << retry.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(MAX_DELAY)
    }

    /// Runs `call` until it succeeds, fails with a non-retriable error, or
    /// the retries are spent.
    pub(crate) async fn run<T, F, Fut>(
        &self,
        operation: &'static str,
        mut call: F,
    ) -> Result<T, DirectoryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DirectoryError>>,
    {
        let mut retry = 0;
        loop {
            let err = match call().await {
                Ok(value) => return Ok(value),
                Err(err) if retry < self.max_retries && is_retriable(&err) => err,
                Err(err) => return Err(err),
            };

            retry += 1;
            let delay = jittered(self.delay_for(retry));
            tracing::warn!(
                operation,
                retry,
                max_retries = self.max_retries,
                ?delay,
                error = %err,
                "directory call failed, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

/// Timeouts, connect failures, and HTTP 5xx.
pub(crate) fn is_retriable(err: &DirectoryError) -> bool {
    let DirectoryError::Http(e) = err else {
        return false;
    };
    e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
}

fn jittered(delay: Duration) -> Duration {
    let spread = rand::random_range(-JITTER..=JITTER);
    delay.mul_f64(1.0 + spread)
}
