//! Retry logic.
//!
//! # Responsibilities
//! - Re-run failed calls whose error matches the provider's retryable
//!   patterns (case-insensitive substring match)
//! - Sleep an exponentially growing, capped backoff between attempts
//! - Surface the last error once attempts are exhausted
//!
//! Backoff sleeps race the run's cancellation token, so a cancelled run
//! never sits out a long delay.

use crate::config::RetryConfig;
use crate::resilience::backoff::calculate_backoff;
use crate::resilience::{OperationError, ResilienceError};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Whether an error message matches any of the provider's retryable
/// patterns.
pub fn is_retryable(policy: &RetryConfig, message: &str) -> bool {
    let message = message.to_lowercase();
    policy
        .retryable_errors
        .iter()
        .any(|pattern| message.contains(&pattern.to_lowercase()))
}

/// Run `call` with up to `policy.max_retries` total attempts.
pub async fn run_with_retry<T, F, Fut>(
    policy: &RetryConfig,
    cancel: &CancellationToken,
    mut call: F,
) -> Result<T, ResilienceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, OperationError>>,
{
    let attempts = policy.max_retries.max(1);
    let mut attempt = 1;
    loop {
        if cancel.is_cancelled() {
            return Err(ResilienceError::Cancelled);
        }

        match call().await {
            Ok(value) => return Ok(value),
            Err(error) => {
                let message = error.to_string();
                if attempt >= attempts || !is_retryable(policy, &message) {
                    return Err(ResilienceError::Operation(message));
                }

                let delay = calculate_backoff(
                    attempt,
                    policy.initial_delay_ms,
                    policy.max_delay_ms,
                    policy.backoff_factor,
                );
                tracing::debug!(
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %message,
                    "Retrying after backoff"
                );
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = cancel.cancelled() => return Err(ResilienceError::Cancelled),
                }
                attempt += 1;
            }
        }
    }
}
