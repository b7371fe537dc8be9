//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Operation call:
//!     → cache.rs (serve fresh, or stale + detached refresh)
//!     → circuit_breaker.rs (fail fast while the provider is down)
//!     → bulkhead.rs (bounded admission, FIFO queue)
//!     → timeouts.rs (deadline around the whole attempt sequence)
//!         → retries.rs (retryable errors, exponential backoff)
//!     → fallback, if the caller supplied one
//! ```
//!
//! # Design Decisions
//! - The composition order above is fixed; runtime.rs is the only caller
//!   that strings the pieces together
//! - One runtime per provider, configured explicitly at construction;
//!   breaker, bulkhead and cache are shared by every run hitting that
//!   provider
//! - Every wait point (queue, backoff sleep) observes the run's
//!   cancellation token

pub mod backoff;
pub mod bulkhead;
pub mod cache;
pub mod circuit_breaker;
pub mod retries;
pub mod runtime;
pub mod timeouts;

use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

pub use bulkhead::Bulkhead;
pub use cache::{CacheLookup, ResponseCache};
pub use circuit_breaker::{BreakerState, CircuitBreaker};
pub use runtime::ResilienceRuntime;

/// Terminal error of a raw provider call.
pub type OperationError = Box<dyn std::error::Error + Send + Sync>;

/// A boxed, owned future producing an operation payload. Used for detached
/// cache refreshes, which outlive the borrowed call context.
pub type BoxedValueFuture =
    Pin<Box<dyn Future<Output = Result<Value, OperationError>> + Send + 'static>>;

/// Deferred builder for a cache refresh call.
pub type RefreshFn = Box<dyn FnOnce() -> BoxedValueFuture + Send + 'static>;

/// Errors produced by the resilience pipeline.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ResilienceError {
    /// The circuit is open; the provider is assumed down.
    #[error("circuit open for {provider}/{class}, retry in {retry_in_ms}ms")]
    CircuitOpen {
        provider: String,
        class: String,
        retry_in_ms: u64,
    },

    /// Both the in-flight limit and the wait queue are full.
    #[error("bulkhead capacity exhausted for {provider} ({max_concurrent} in flight, {max_queue} queued)")]
    BulkheadCapacity {
        provider: String,
        max_concurrent: usize,
        max_queue: usize,
    },

    /// The per-operation deadline elapsed.
    #[error("operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// The run's cancellation token fired while waiting.
    #[error("run cancelled")]
    Cancelled,

    /// The provider call itself failed (terminal, post-retry).
    #[error("{0}")]
    Operation(String),
}
