//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, factors >= 1, rates in 0..=1)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: EngineConfig → Result<(), Vec<ConfigDefect>>
//! - Runs before config is accepted into the system

use crate::config::schema::EngineConfig;
use std::fmt;

/// A single configuration defect, with the provider and field it concerns.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDefect {
    pub scope: String,
    pub field: String,
    pub problem: String,
}

impl fmt::Display for ConfigDefect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}: {}", self.scope, self.field, self.problem)
    }
}

fn defect(scope: &str, field: &str, problem: impl Into<String>) -> ConfigDefect {
    ConfigDefect {
        scope: scope.to_string(),
        field: field.to_string(),
        problem: problem.into(),
    }
}

/// Validate an engine configuration, returning every defect found.
pub fn validate_config(config: &EngineConfig) -> Result<(), Vec<ConfigDefect>> {
    let mut defects = Vec::new();

    for (provider_id, resilience) in &config.providers {
        let scope = format!("providers.{provider_id}");

        if resilience.timeout_ms == 0 {
            defects.push(defect(&scope, "timeout_ms", "must be > 0"));
        }
        if resilience.retry.backoff_factor < 1.0 {
            defects.push(defect(&scope, "retry.backoff_factor", "must be >= 1.0"));
        }
        if resilience.retry.max_delay_ms < resilience.retry.initial_delay_ms {
            defects.push(defect(
                &scope,
                "retry.max_delay_ms",
                "must be >= initial_delay_ms",
            ));
        }
        if resilience.circuit_breaker.failure_threshold == 0 {
            defects.push(defect(
                &scope,
                "circuit_breaker.failure_threshold",
                "must be > 0",
            ));
        }
        if resilience.circuit_breaker.half_open_success_threshold == 0 {
            defects.push(defect(
                &scope,
                "circuit_breaker.half_open_success_threshold",
                "must be > 0",
            ));
        }
        if resilience.bulkhead.max_concurrent_calls == 0 {
            defects.push(defect(
                &scope,
                "bulkhead.max_concurrent_calls",
                "must be > 0",
            ));
        }
        if resilience.cache.ttl_ms == 0 && resilience.cache.stale_while_revalidate {
            defects.push(defect(
                &scope,
                "cache.ttl_ms",
                "must be > 0 when stale_while_revalidate is set",
            ));
        }
    }

    if config.health.enabled {
        if config.health.interval_secs == 0 {
            defects.push(defect("health", "interval_secs", "must be > 0"));
        }
        if !(0.0..=1.0).contains(&config.health.failure_rate_threshold) {
            defects.push(defect(
                "health",
                "failure_rate_threshold",
                "must be within 0.0..=1.0",
            ));
        }
    }

    if defects.is_empty() {
        Ok(())
    } else {
        Err(defects)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::ResilienceConfig;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate_config(&EngineConfig::default()).is_ok());
    }

    #[test]
    fn test_all_defects_reported() {
        let mut config = EngineConfig::default();
        let mut bad = ResilienceConfig::default();
        bad.timeout_ms = 0;
        bad.retry.backoff_factor = 0.5;
        bad.bulkhead.max_concurrent_calls = 0;
        config.providers.insert("zephyr".to_string(), bad);
        config.health.failure_rate_threshold = 2.0;

        let defects = validate_config(&config).unwrap_err();
        assert_eq!(defects.len(), 4);
        assert!(defects.iter().any(|d| d.field == "timeout_ms"));
        assert!(defects.iter().any(|d| d.field == "retry.backoff_factor"));
        assert!(defects
            .iter()
            .any(|d| d.field == "bulkhead.max_concurrent_calls"));
        assert!(defects
            .iter()
            .any(|d| d.field == "failure_rate_threshold"));
    }
}
