//! Provider health state.
//!
//! # States
//! - Up: probe passing, latency and failure rate nominal
//! - Degraded: probe passing but slow, or failure rate elevated
//! - Down: probe failing
//!
//! The failure rate is a decaying score, not a windowed ratio: each
//! success multiplies it by 0.8, each failure grows it by 20% plus 0.1,
//! capped at 1.0. Successes therefore forgive quickly but a burst of
//! failures saturates fast.

use crate::config::HealthCheckConfig;
use crate::executor::context::epoch_ms;
use serde::Serialize;

/// Advisory health classification of one provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HealthStatus {
    Up,
    Degraded,
    Down,
}

impl HealthStatus {
    /// Gauge level for metrics: 2=up, 1=degraded, 0=down.
    pub fn level(&self) -> u8 {
        match self {
            HealthStatus::Up => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Down => 0,
        }
    }
}

/// Snapshot of one provider's health, published after every probe.
#[derive(Debug, Clone, Serialize)]
pub struct ProviderHealth {
    pub status: HealthStatus,
    pub last_checked_ms: u64,
    pub response_time_ms: u64,
    pub failure_rate: f64,
}

impl ProviderHealth {
    /// Initial state before the first probe.
    pub fn unknown() -> Self {
        Self {
            status: HealthStatus::Up,
            last_checked_ms: 0,
            response_time_ms: 0,
            failure_rate: 0.0,
        }
    }

    /// Fold one probe observation into the previous snapshot.
    pub fn observe(
        &self,
        healthy: bool,
        response_time_ms: u64,
        config: &HealthCheckConfig,
    ) -> ProviderHealth {
        let failure_rate = if healthy {
            self.failure_rate * 0.8
        } else {
            (self.failure_rate * 1.2 + 0.1).min(1.0)
        };

        let status = if !healthy {
            HealthStatus::Down
        } else if response_time_ms > config.latency_threshold_ms
            || failure_rate > config.failure_rate_threshold
        {
            HealthStatus::Degraded
        } else {
            HealthStatus::Up
        };

        ProviderHealth {
            status,
            last_checked_ms: epoch_ms(),
            response_time_ms,
            failure_rate,
        }
    }
}
