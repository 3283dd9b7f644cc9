//! Bounded exponential-backoff retry.
//!
//! Only transient failures (connection errors and generic API errors) are
//! retried. Authentication, credit, rate-limit, validation and timeout
//! failures propagate on first occurrence.

use crate::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tracing::warn;

pub const MIN_BACKOFF: Duration = Duration::from_secs(1);
pub const MAX_BACKOFF: Duration = Duration::from_secs(30);

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Retry { delay: Duration },
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    /// Base delay; doubled on each retry
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before the retry that follows failed attempt `attempt` (0-based):
    /// `retry_delay * 2^attempt`, clamped to [`MIN_BACKOFF`, `MAX_BACKOFF`].
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = i32::try_from(attempt).unwrap_or(i32::MAX);
        let secs = self.retry_delay.as_secs_f64() * 2f64.powi(exp);
        let secs = secs.clamp(MIN_BACKOFF.as_secs_f64(), MAX_BACKOFF.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    pub fn decide(&self, err: &Error, attempt: u32) -> Decision {
        if err.is_retryable() && attempt < self.max_retries {
            Decision::Retry {
                delay: self.backoff(attempt),
            }
        } else {
            Decision::Fail
        }
    }

    /// Run `op` until it succeeds, fails definitively, or attempts run out.
    /// `op` receives the 0-based attempt number. The last error is returned as-is.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0u32;
        loop {
            let err = match op(attempt).await {
                Ok(v) => return Ok(v),
                Err(e) => e,
            };
            match self.decide(&err, attempt) {
                Decision::Retry { delay } => {
                    warn!(
                        attempt = attempt + 1,
                        max_attempts = self.max_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying after transient failure"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Decision::Fail => return Err(err),
            }
        }
    }
}
