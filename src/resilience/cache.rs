//! Response caching with stale-while-revalidate.
//!
//! # Responsibilities
//! - Serve cached operation payloads while they are fresh
//! - Optionally serve stale payloads while a detached refresh runs
//! - Support explicit invalidation
//!
//! Background refreshes are real spawned tasks with their own cancellation
//! scope, and their failures are logged; nothing is fired and forgotten.

use crate::config::CacheConfig;
use crate::observability::metrics;
use crate::resilience::RefreshFn;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// A cached payload and when it was stored.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub value: Value,
    pub stored_at: Instant,
}

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup {
    /// Entry younger than the ttl.
    Fresh(Value),
    /// Entry past the ttl, served because stale_while_revalidate is set.
    Stale(Value),
    Miss,
}

/// Shared per-provider response cache.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    provider: String,
    config: CacheConfig,
    entries: Arc<DashMap<String, CacheEntry>>,
    /// Keys with a refresh task in flight, to avoid duplicate refreshes.
    refreshing: Arc<DashMap<String, ()>>,
}

impl ResponseCache {
    pub fn new(provider: &str, config: CacheConfig) -> Self {
        Self {
            provider: provider.to_string(),
            config,
            entries: Arc::new(DashMap::new()),
            refreshing: Arc::new(DashMap::new()),
        }
    }

    fn ttl(&self) -> Duration {
        Duration::from_millis(self.config.ttl_ms)
    }

    /// Look up a key, classifying the entry by age.
    pub fn lookup(&self, key: &str) -> CacheLookup {
        let Some(entry) = self.entries.get(key) else {
            metrics::record_cache_lookup(&self.provider, "miss");
            return CacheLookup::Miss;
        };

        let age = entry.stored_at.elapsed();
        if age < self.ttl() {
            metrics::record_cache_lookup(&self.provider, "fresh");
            return CacheLookup::Fresh(entry.value.clone());
        }
        if self.config.stale_while_revalidate {
            metrics::record_cache_lookup(&self.provider, "stale");
            return CacheLookup::Stale(entry.value.clone());
        }

        drop(entry);
        self.entries.remove(key);
        metrics::record_cache_lookup(&self.provider, "expired");
        CacheLookup::Miss
    }

    pub fn insert(&self, key: &str, value: Value) {
        self.entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawn a detached refresh for `key`. The task gets a child scope of
    /// the caller's cancellation token: cancelling the run stops the
    /// refresh, but the refresh outcome never affects the run.
    ///
    /// At most one refresh per key is in flight; extra requests are
    /// dropped.
    pub fn spawn_refresh(&self, key: &str, cancel: &CancellationToken, refresh: RefreshFn) {
        use dashmap::mapref::entry::Entry;
        match self.refreshing.entry(key.to_string()) {
            Entry::Occupied(_) => return,
            Entry::Vacant(slot) => {
                slot.insert(());
            }
        }

        let cache = self.clone();
        let key = key.to_string();
        let scope = cancel.child_token();
        tokio::spawn(async move {
            let outcome = tokio::select! {
                result = refresh() => Some(result),
                _ = scope.cancelled() => None,
            };
            match outcome {
                Some(Ok(value)) => {
                    cache.insert(&key, value);
                    tracing::debug!(
                        provider = %cache.provider,
                        key = %key,
                        "Cache entry refreshed"
                    );
                }
                Some(Err(error)) => {
                    tracing::warn!(
                        provider = %cache.provider,
                        key = %key,
                        error = %error,
                        "Background cache refresh failed"
                    );
                }
                None => {
                    tracing::debug!(
                        provider = %cache.provider,
                        key = %key,
                        "Background cache refresh cancelled"
                    );
                }
            }
            cache.refreshing.remove(&key);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cache(ttl_ms: u64, swr: bool) -> ResponseCache {
        ResponseCache::new(
            "zephyr",
            CacheConfig {
                ttl_ms,
                stale_while_revalidate: swr,
            },
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_fresh_within_ttl() {
        let c = cache(1_000, false);
        c.insert("projects", json!(["PROJ-1"]));
        assert_eq!(
            c.lookup("projects"),
            CacheLookup::Fresh(json!(["PROJ-1"]))
        );

        tokio::time::sleep(Duration::from_millis(1_001)).await;
        assert_eq!(c.lookup("projects"), CacheLookup::Miss);
        // Expired entries are evicted on lookup.
        assert!(c.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_served_when_revalidating() {
        let c = cache(1_000, true);
        c.insert("projects", json!(["PROJ-1"]));

        tokio::time::sleep(Duration::from_millis(2_000)).await;
        assert_eq!(
            c.lookup("projects"),
            CacheLookup::Stale(json!(["PROJ-1"]))
        );
        // Stale entries stay until the refresh replaces them.
        assert_eq!(c.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_replaces_entry() {
        let c = cache(100, true);
        c.insert("projects", json!(["old"]));
        tokio::time::sleep(Duration::from_millis(200)).await;

        let cancel = CancellationToken::new();
        c.spawn_refresh(
            "projects",
            &cancel,
            Box::new(|| Box::pin(async { Ok(json!(["new"])) })),
        );
        tokio::task::yield_now().await;

        match c.lookup("projects") {
            CacheLookup::Fresh(v) => assert_eq!(v, json!(["new"])),
            other => panic!("expected refreshed entry, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_entry() {
        let c = cache(100, true);
        c.insert("projects", json!(["old"]));

        let cancel = CancellationToken::new();
        c.spawn_refresh(
            "projects",
            &cancel,
            Box::new(|| Box::pin(async { Err("503 from provider".into()) })),
        );
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(c.len(), 1);
        assert!(c.refreshing.is_empty());
    }

    #[tokio::test]
    async fn test_invalidate_removes_entry() {
        let c = cache(60_000, false);
        c.insert("projects", json!([]));
        c.invalidate("projects");
        assert_eq!(c.lookup("projects"), CacheLookup::Miss);
    }
}
