//! Bounded retry with linear backoff.

use std::future::Future;
use std::time::Duration;

use coachcraft_types::llm::LlmError;

/// Re-runs a failing completion attempt.
///
/// A call gets `max_retries + 1` attempts. After the n-th failed attempt the
/// policy sleeps `delay * n` before trying again, so with a 500 ms delay the
/// waits are 500 ms, 1000 ms, 1500 ms and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    delay: Duration,
}

impl RetryPolicy {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Wait before the attempt that follows failed attempt number `attempt`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.delay.checked_mul(attempt).unwrap_or(Duration::MAX)
    }

    /// Drive `operation` until it succeeds, fails with a non-retryable error,
    /// or runs out of attempts.
    ///
    /// Exhaustion is reported as [`LlmError::RetryExhausted`] wrapping the
    /// last failure.
    pub async fn run<T, F, Fut>(&self, max_retries: u32, mut operation: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            let err = match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            if !err.is_retryable() {
                return Err(err);
            }
            if attempt > max_retries {
                tracing::error!(attempts = attempt, error = %err, "Completion failed, giving up");
                return Err(LlmError::RetryExhausted {
                    attempts: attempt,
                    source: Box::new(err),
                });
            }

            let wait = self.backoff(attempt);
            tracing::warn!(
                attempt,
                max_retries,
                delay_ms = wait.as_millis() as u64,
                error = %err,
                "Completion attempt failed, retrying"
            );
            tokio::time::sleep(wait).await;
        }
    }
}
