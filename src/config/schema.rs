//! Configuration schema definitions.
//!
//! This module defines the per-provider resilience configuration surface
//! and the health monitor settings. All types derive Serde traits for
//! deserialization from config files; every knob has a production-sane
//! default so a partial file is still usable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Root configuration for the orchestration engine.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    /// Per-provider resilience settings, keyed by provider id.
    pub providers: HashMap<String, ResilienceConfig>,

    /// Health monitor settings.
    pub health: HealthCheckConfig,
}

impl EngineConfig {
    /// Resilience settings for a provider, falling back to defaults for
    /// providers the file does not mention.
    pub fn provider(&self, provider_id: &str) -> ResilienceConfig {
        self.providers
            .get(provider_id)
            .cloned()
            .unwrap_or_default()
    }
}

/// Complete resilience settings for one provider.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResilienceConfig {
    pub retry: RetryConfig,

    /// Per-operation deadline in milliseconds.
    pub timeout_ms: u64,

    pub circuit_breaker: CircuitBreakerConfig,

    pub bulkhead: BulkheadConfig,

    pub cache: CacheConfig,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            timeout_ms: 30_000,
            circuit_breaker: CircuitBreakerConfig::default(),
            bulkhead: BulkheadConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Retry with exponential backoff.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Maximum retry attempts after the initial call.
    pub max_retries: u32,

    /// First backoff delay in milliseconds.
    pub initial_delay_ms: u64,

    /// Backoff cap in milliseconds.
    pub max_delay_ms: u64,

    /// Multiplier applied to the delay after each attempt.
    pub backoff_factor: f64,

    /// Substrings of error messages that are worth retrying.
    pub retryable_errors: Vec<String>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            backoff_factor: 2.0,
            retryable_errors: vec![
                "timeout".to_string(),
                "rate limit".to_string(),
                "429".to_string(),
                "503".to_string(),
                "connection".to_string(),
            ],
        }
    }
}

/// Circuit breaker thresholds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// How long the circuit stays open before a half-open probe, in
    /// milliseconds.
    pub reset_timeout_ms: u64,

    /// Consecutive half-open successes before the circuit closes.
    pub half_open_success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            reset_timeout_ms: 30_000,
            half_open_success_threshold: 2,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn reset_timeout(&self) -> Duration {
        Duration::from_millis(self.reset_timeout_ms)
    }
}

/// Bulkhead admission limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BulkheadConfig {
    /// Maximum in-flight calls to the provider.
    pub max_concurrent_calls: usize,

    /// Maximum callers waiting for a slot.
    pub max_queue_size: usize,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self {
            max_concurrent_calls: 10,
            max_queue_size: 20,
        }
    }
}

/// Response cache settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Freshness window in milliseconds.
    pub ttl_ms: u64,

    /// Serve stale entries while a background refresh runs.
    pub stale_while_revalidate: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 60_000,
            stale_while_revalidate: false,
        }
    }
}

/// Health monitor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable the background prober.
    pub enabled: bool,

    /// Probe interval in seconds.
    pub interval_secs: u64,

    /// Probe timeout in seconds.
    pub timeout_secs: u64,

    /// Response time above this is DEGRADED, in milliseconds.
    pub latency_threshold_ms: u64,

    /// Failure rate above this is DEGRADED (0.0..=1.0).
    pub failure_rate_threshold: f64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 30,
            timeout_secs: 10,
            latency_threshold_ms: 2_000,
            failure_rate_threshold: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = EngineConfig::default();
        let provider = config.provider("zephyr");
        assert!(provider.retry.max_retries > 0);
        assert!(provider.circuit_breaker.failure_threshold > 0);
        assert!(provider.bulkhead.max_concurrent_calls > 0);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let toml_src = r#"
            [providers.zephyr.retry]
            max_retries = 7

            [providers.zephyr.circuit_breaker]
            failure_threshold = 3
        "#;
        let config: EngineConfig = toml::from_str(toml_src).unwrap();
        let zephyr = config.provider("zephyr");
        assert_eq!(zephyr.retry.max_retries, 7);
        assert_eq!(zephyr.circuit_breaker.failure_threshold, 3);
        // Unspecified knobs fall back to defaults.
        assert_eq!(zephyr.retry.backoff_factor, 2.0);
        assert_eq!(zephyr.bulkhead.max_queue_size, 20);
        // Unmentioned providers are fully defaulted.
        assert_eq!(config.provider("qtest").retry.max_retries, 3);
    }
}
