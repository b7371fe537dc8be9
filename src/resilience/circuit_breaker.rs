//! Circuit breaker for provider protection.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: provider assumed down, calls fail fast
//! - HalfOpen: probing whether the provider recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: failure_threshold consecutive failures
//! Open → HalfOpen: first call after reset_timeout elapses
//! HalfOpen → Closed: half_open_success_threshold consecutive successes
//! HalfOpen → Open: any failure
//! ```
//!
//! One breaker exists per (provider, operation class) and is shared by
//! every concurrent run hitting that provider, so all transitions happen
//! under one mutex.

use crate::config::CircuitBreakerConfig;
use crate::observability::metrics;
use std::sync::Mutex;
// tokio's Instant respects the paused test clock, unlike std's.
use tokio::time::Instant;

/// Circuit breaker states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

#[derive(Debug)]
struct BreakerInner {
    state: BreakerState,
    failure_count: u32,
    success_count: u32,
    last_failure: Option<Instant>,
}

/// Shared circuit breaker guarding one (provider, class) endpoint.
#[derive(Debug)]
pub struct CircuitBreaker {
    provider: String,
    class: String,
    config: CircuitBreakerConfig,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(provider: &str, class: &str, config: CircuitBreakerConfig) -> Self {
        Self {
            provider: provider.to_string(),
            class: class.to_string(),
            config,
            inner: Mutex::new(BreakerInner {
                state: BreakerState::Closed,
                failure_count: 0,
                success_count: 0,
                last_failure: None,
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BreakerInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Admit or reject a call. While open, returns the remaining cooldown
    /// in milliseconds; the first call after the cooldown flips the breaker
    /// to half-open and passes.
    pub fn try_acquire(&self) -> Result<(), u64> {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed | BreakerState::HalfOpen => Ok(()),
            BreakerState::Open => {
                let elapsed = inner
                    .last_failure
                    .map(|at| at.elapsed())
                    .unwrap_or_default();
                let reset = self.config.reset_timeout();
                if elapsed >= reset {
                    self.transition(&mut inner, BreakerState::HalfOpen);
                    inner.success_count = 0;
                    Ok(())
                } else {
                    Err((reset - elapsed).as_millis() as u64)
                }
            }
        }
    }

    /// Record a successful call.
    pub fn on_success(&self) {
        let mut inner = self.lock();
        match inner.state {
            BreakerState::Closed => {
                inner.failure_count = 0;
            }
            BreakerState::HalfOpen => {
                inner.success_count += 1;
                if inner.success_count >= self.config.half_open_success_threshold {
                    inner.failure_count = 0;
                    inner.success_count = 0;
                    self.transition(&mut inner, BreakerState::Closed);
                }
            }
            // A success while open can only come from a call admitted
            // before the circuit tripped; it does not close the circuit.
            BreakerState::Open => {}
        }
    }

    /// Record a failed call.
    pub fn on_failure(&self) {
        let mut inner = self.lock();
        inner.last_failure = Some(Instant::now());
        match inner.state {
            BreakerState::Closed => {
                inner.failure_count += 1;
                if inner.failure_count >= self.config.failure_threshold {
                    self.transition(&mut inner, BreakerState::Open);
                }
            }
            BreakerState::HalfOpen => {
                inner.failure_count = 0;
                inner.success_count = 0;
                self.transition(&mut inner, BreakerState::Open);
            }
            BreakerState::Open => {}
        }
    }

    pub fn state(&self) -> BreakerState {
        self.lock().state
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    fn transition(&self, inner: &mut BreakerInner, to: BreakerState) {
        let from = inner.state;
        inner.state = to;
        tracing::info!(
            provider = %self.provider,
            class = %self.class,
            from = from.as_str(),
            to = to.as_str(),
            "Circuit breaker transition"
        );
        metrics::record_breaker_transition(&self.provider, &self.class, to.as_str());
    }
}
