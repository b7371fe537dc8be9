//! Exponential backoff with jitter.

use rand::Rng;
use std::time::Duration;

/// Calculate the backoff delay before retry `attempt` (1-based).
///
/// The delay grows geometrically from `initial_ms` by `factor`, is capped
/// at `max_ms`, and carries 0-10% additive jitter so synchronized callers
/// spread out.
pub fn calculate_backoff(attempt: u32, initial_ms: u64, max_ms: u64, factor: f64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponent = factor.max(1.0).powi(attempt.saturating_sub(1) as i32);
    let delay_ms = ((initial_ms as f64) * exponent).min(max_ms as f64) as u64;

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = delay_ms / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(delay_ms.saturating_add(jitter))
}
