//! Retry with exponential backoff for transient connectivity failures.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::{Result, StoreError};

/// How often and how patiently connection failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles for every further one.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the default attempt budget and the given base
    /// delay.
    pub fn with_base_delay(base_delay: Duration) -> Self {
        Self {
            base_delay,
            ..Self::default()
        }
    }

    /// Delay to wait after failed attempt number `attempt` (1-based):
    /// `base_delay * 2^(attempt - 1)`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

/// Runs `operation`, retrying connection failures.
///
/// - Non-connection errors are returned unchanged on first occurrence.
/// - Connection errors are retried until `policy.max_attempts` is reached,
///   sleeping per [`RetryPolicy::delay_for`] and then calling `reconnect`,
///   whose own failure is ignored.
/// - When the budget is spent, the last error is wrapped in
///   [`StoreError::Unavailable`].
pub async fn retry_on_connection_error<T, F, Fut, R, RFut>(
    policy: &RetryPolicy,
    operation_name: &'static str,
    mut operation: F,
    mut reconnect: R,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    R: FnMut() -> RFut,
    RFut: Future<Output = Result<()>>,
{
    let mut attempt = 0;

    loop {
        attempt += 1;

        let error = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(
                        operation = operation_name,
                        attempt,
                        "store operation succeeded after retry"
                    );
                }
                return Ok(value);
            }
            Err(error) => error,
        };

        if !error.is_connection_error() {
            return Err(error);
        }

        if attempt >= policy.max_attempts {
            tracing::error!(
                operation = operation_name,
                attempt,
                error = %error,
                "store unreachable, giving up"
            );
            metrics::counter!("store_unavailable_total").increment(1);
            return Err(StoreError::unavailable(error));
        }

        let delay = policy.delay_for(attempt);
        tracing::warn!(
            operation = operation_name,
            attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "connection failure, retrying after delay"
        );
        metrics::counter!("store_retries_total", "operation" => operation_name).increment(1);

        sleep(delay).await;

        if let Err(err) = reconnect().await {
            tracing::debug!(operation = operation_name, error = %err, "reconnect failed");
        }
    }
}
