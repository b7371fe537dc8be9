//! Per-provider resilience runtime.
//!
//! The single entry point wrapping every outbound operation call, in the
//! fixed order cache → circuit breaker → bulkhead → timeout(retry(call)),
//! with an optional caller-supplied fallback applied to the terminal error.
//!
//! One runtime exists per provider and is shared by every concurrent run
//! targeting it; the breaker table, bulkhead and cache inside are the only
//! shared mutable state between runs.

use crate::config::ResilienceConfig;
use crate::observability::metrics;
use crate::resilience::bulkhead::Bulkhead;
use crate::resilience::cache::{CacheLookup, ResponseCache};
use crate::resilience::circuit_breaker::CircuitBreaker;
use crate::resilience::retries::run_with_retry;
use crate::resilience::timeouts::with_timeout;
use crate::resilience::{OperationError, RefreshFn, ResilienceError};
use dashmap::DashMap;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Fallback hook: maps the terminal error to a substitute payload, or
/// `None` to let the error propagate.
pub type Fallback<'a> = &'a (dyn Fn(&ResilienceError) -> Option<Value> + Send + Sync);

/// Resilience facade for one provider.
pub struct ResilienceRuntime {
    provider_id: String,
    config: ResilienceConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    bulkhead: Bulkhead,
    cache: ResponseCache,
}

impl ResilienceRuntime {
    /// Build a runtime from an explicit configuration. There is no global
    /// configuration table; this value is the only source of settings.
    pub fn new(provider_id: &str, config: ResilienceConfig) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            bulkhead: Bulkhead::new(provider_id, config.bulkhead.clone()),
            cache: ResponseCache::new(provider_id, config.cache.clone()),
            breakers: DashMap::new(),
            config,
        }
    }

    pub fn provider_id(&self) -> &str {
        &self.provider_id
    }

    pub fn cache(&self) -> &ResponseCache {
        &self.cache
    }

    pub fn bulkhead(&self) -> &Bulkhead {
        &self.bulkhead
    }

    /// The breaker guarding one operation class, created on first use.
    pub fn breaker(&self, class: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(class.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(
                    &self.provider_id,
                    class,
                    self.config.circuit_breaker.clone(),
                ))
            })
            .clone()
    }

    /// Execute one protected call.
    ///
    /// `call` may be invoked several times (retries). `refresh` is only
    /// used when a stale cache entry is served; it must own everything it
    /// needs, because it outlives this invocation.
    pub async fn execute<F, Fut>(
        &self,
        class: &str,
        cancel: &CancellationToken,
        cache_key: Option<&str>,
        refresh: Option<RefreshFn>,
        fallback: Option<Fallback<'_>>,
        call: F,
    ) -> Result<Value, ResilienceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Value, OperationError>>,
    {
        if let Some(key) = cache_key {
            match self.cache.lookup(key) {
                CacheLookup::Fresh(value) => return Ok(value),
                CacheLookup::Stale(value) => {
                    if let Some(refresh) = refresh {
                        self.cache.spawn_refresh(key, cancel, refresh);
                    }
                    return Ok(value);
                }
                CacheLookup::Miss => {}
            }
        }

        let result = self.protected_call(class, cancel, call).await;

        match result {
            Ok(value) => {
                if let Some(key) = cache_key {
                    self.cache.insert(key, value.clone());
                }
                Ok(value)
            }
            Err(error) => {
                if let Some(fallback) = fallback {
                    if let Some(substitute) = fallback(&error) {
                        tracing::warn!(
                            provider = %self.provider_id,
                            class = %class,
                            error = %error,
                            "Using fallback value after terminal error"
                        );
                        return Ok(substitute);
                    }
                }
                Err(error)
            }
        }
    }

    async fn protected_call<F, Fut>(
        &self,
        class: &str,
        cancel: &CancellationToken,
        call: F,
    ) -> Result<Value, ResilienceError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Value, OperationError>>,
    {
        let breaker = self.breaker(class);
        breaker
            .try_acquire()
            .map_err(|retry_in_ms| ResilienceError::CircuitOpen {
                provider: self.provider_id.clone(),
                class: class.to_string(),
                retry_in_ms,
            })?;

        // Holding the permit across timeout(retry(call)) is what bounds
        // provider concurrency.
        let _permit = self.bulkhead.acquire(cancel).await?;

        let outcome = with_timeout(
            self.config.timeout_ms,
            run_with_retry(&self.config.retry, cancel, call),
        )
        .await;

        match &outcome {
            Ok(_) => breaker.on_success(),
            // Cancellation says nothing about provider health.
            Err(ResilienceError::Cancelled) => {}
            Err(_) => breaker.on_failure(),
        }
        metrics::record_protected_call(&self.provider_id, class, outcome.is_ok());
        outcome
    }
}

/// Shared table of per-provider runtimes, built once from configuration.
#[derive(Default)]
pub struct RuntimeRegistry {
    runtimes: DashMap<String, Arc<ResilienceRuntime>>,
}

impl RuntimeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The runtime for a provider, created from `config` on first use.
    /// Every run targeting the same provider gets the same instance.
    pub fn get_or_create(
        &self,
        provider_id: &str,
        config: &ResilienceConfig,
    ) -> Arc<ResilienceRuntime> {
        self.runtimes
            .entry(provider_id.to_string())
            .or_insert_with(|| Arc::new(ResilienceRuntime::new(provider_id, config.clone())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CircuitBreakerConfig, RetryConfig};
    use serde_json::json;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn runtime() -> ResilienceRuntime {
        let mut config = ResilienceConfig::default();
        config.retry = RetryConfig {
            max_retries: 3,
            initial_delay_ms: 1,
            max_delay_ms: 10,
            backoff_factor: 2.0,
            retryable_errors: vec!["503".to_string()],
        };
        config.circuit_breaker = CircuitBreakerConfig {
            failure_threshold: 2,
            reset_timeout_ms: 60_000,
            half_open_success_threshold: 1,
        };
        config.cache.ttl_ms = 60_000;
        ResilienceRuntime::new("zephyr", config)
    }

    #[tokio::test]
    async fn test_success_is_cached_and_served() {
        let rt = runtime();
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);

        for _ in 0..3 {
            let value = rt
                .execute("GET_PROJECTS", &cancel, Some("projects"), None, None, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    std::future::ready(Ok(json!(["PROJ-1"])))
                })
                .await
                .unwrap();
            assert_eq!(value, json!(["PROJ-1"]));
        }
        // Second and third calls are cache hits.
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_breaker_opens_and_rejects() {
        let rt = runtime();
        let cancel = CancellationToken::new();

        for _ in 0..2 {
            let err = rt
                .execute("CREATE_TEST_CASE", &cancel, None, None, None, || {
                    std::future::ready(Err::<Value, _>("400 bad request".into()))
                })
                .await
                .unwrap_err();
            assert!(matches!(err, ResilienceError::Operation(_)));
        }

        let err = rt
            .execute("CREATE_TEST_CASE", &cancel, None, None, None, || {
                std::future::ready(Ok(json!(null)))
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ResilienceError::CircuitOpen { .. }));

        // Breakers are per operation class: other classes still pass.
        let ok = rt
            .execute("GET_PROJECTS", &cancel, None, None, None, || {
                std::future::ready(Ok(json!([])))
            })
            .await;
        assert!(ok.is_ok());
    }

    #[tokio::test]
    async fn test_fallback_replaces_terminal_error() {
        let rt = runtime();
        let cancel = CancellationToken::new();

        let fallback = |_: &ResilienceError| Some(json!({"fallback": true}));
        let value = rt
            .execute(
                "GET_ATTACHMENTS",
                &cancel,
                None,
                None,
                Some(&fallback),
                || std::future::ready(Err::<Value, _>("400 bad request".into())),
            )
            .await
            .unwrap();
        assert_eq!(value, json!({"fallback": true}));
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let rt = runtime();
        let cancel = CancellationToken::new();
        let calls = AtomicU32::new(0);

        let value = rt
            .execute("GET_TEST_CASES", &cancel, None, None, None, || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                std::future::ready(if n < 2 {
                    Err::<Value, OperationError>("503 service unavailable".into())
                } else {
                    Ok(json!({"cases": 12}))
                })
            })
            .await
            .unwrap();

        assert_eq!(value, json!({"cases": 12}));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_registry_shares_runtimes_per_provider() {
        let registry = RuntimeRegistry::new();
        let config = ResilienceConfig::default();
        let a = registry.get_or_create("qtest", &config);
        let b = registry.get_or_create("qtest", &config);
        assert!(Arc::ptr_eq(&a, &b));
    }
}
