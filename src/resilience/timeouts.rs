//! Timeout enforcement.
//!
//! Races a call against a deadline. The loser is dropped, not awaited:
//! a timed-out call never blocks the caller further.

use crate::resilience::ResilienceError;
use std::future::Future;
use std::time::Duration;

/// Apply a deadline to `fut`. A `timeout_ms` of 0 disables the deadline.
pub async fn with_timeout<T>(
    timeout_ms: u64,
    fut: impl Future<Output = Result<T, ResilienceError>>,
) -> Result<T, ResilienceError> {
    if timeout_ms == 0 {
        return fut.await;
    }
    match tokio::time::timeout(Duration::from_millis(timeout_ms), fut).await {
        Ok(result) => result,
        Err(_) => Err(ResilienceError::Timeout { timeout_ms }),
    }
}
