//! Metrics collection.
//!
//! # Metrics
//! - `engine_operations_total` (counter): executed operations by provider,
//!   operation and outcome
//! - `engine_operation_duration_ms` (histogram): per-operation latency
//! - `engine_protected_calls_total` (counter): resilience pipeline outcomes
//! - `engine_breaker_transitions_total` (counter): circuit state changes
//! - `engine_bulkhead_rejections_total` (counter): capacity rejections
//! - `engine_cache_lookups_total` (counter): cache outcomes by kind
//! - `engine_provider_health` (gauge): 2=up, 1=degraded, 0=down

use metrics::{counter, gauge, histogram};

pub fn record_operation(provider: &str, operation: &str, success: bool, duration_ms: u64) {
    counter!(
        "engine_operations_total",
        "provider" => provider.to_string(),
        "operation" => operation.to_string(),
        "outcome" => if success { "success" } else { "failure" },
    )
    .increment(1);
    histogram!(
        "engine_operation_duration_ms",
        "provider" => provider.to_string(),
        "operation" => operation.to_string(),
    )
    .record(duration_ms as f64);
}

pub fn record_protected_call(provider: &str, class: &str, success: bool) {
    counter!(
        "engine_protected_calls_total",
        "provider" => provider.to_string(),
        "class" => class.to_string(),
        "outcome" => if success { "success" } else { "failure" },
    )
    .increment(1);
}

pub fn record_breaker_transition(provider: &str, class: &str, to: &str) {
    counter!(
        "engine_breaker_transitions_total",
        "provider" => provider.to_string(),
        "class" => class.to_string(),
        "to" => to.to_string(),
    )
    .increment(1);
}

pub fn record_bulkhead_rejection(provider: &str) {
    counter!(
        "engine_bulkhead_rejections_total",
        "provider" => provider.to_string(),
    )
    .increment(1);
}

pub fn record_cache_lookup(provider: &str, kind: &str) {
    counter!(
        "engine_cache_lookups_total",
        "provider" => provider.to_string(),
        "kind" => kind.to_string(),
    )
    .increment(1);
}

pub fn record_provider_health(provider: &str, level: u8) {
    gauge!(
        "engine_provider_health",
        "provider" => provider.to_string(),
    )
    .set(level as f64);
}
