//! Retry wrapper shared by every adapter call-site.
//!
//! Policy: up to 3 attempts with exponential backoff (250 ms, 1 s, 4 s).
//! Non-retryable errors (bad request, config, unparseable response) abort
//! immediately.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::{ProviderError, Result};

/// Backoff schedule for provider calls.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff_factor: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(250),
            backoff_factor: 4,
        }
    }
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * self.backoff_factor.pow(attempt.saturating_sub(1))
    }
}

/// Run `op` under the default policy, retrying transient failures.
pub async fn with_retry<T, F, Fut>(op_name: &str, op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    with_retry_policy(op_name, RetryPolicy::default(), op).await
}

/// Run `op` under an explicit policy.
pub async fn with_retry_policy<T, F, Fut>(op_name: &str, policy: RetryPolicy, op: F) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.delay_for(attempt);
                warn!(
                    op = op_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "provider call failed, retrying"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(err) => {
                if err.is_retryable() {
                    warn!(op = op_name, attempt, error = %err, "provider call failed, giving up");
                }
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    #[test]
    fn backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_ref = calls.clone();

        let result = with_retry("test", move || {
            let calls = calls_ref.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(ProviderError::Transient("flaky".into()))
                } else {
                    Ok(42)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(result, 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_ref = calls.clone();

        let result: Result<()> = with_retry("test", move || {
            let calls = calls_ref.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::RateLimited("slow down".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn bad_request_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_ref = calls.clone();

        let result: Result<()> = with_retry("test", move || {
            let calls = calls_ref.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(ProviderError::BadRequest("malformed".into()))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
