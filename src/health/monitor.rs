//! Active health monitoring.
//!
//! # Responsibilities
//! - Periodically probe each provider
//! - Fold probe outcomes into the provider's health snapshot
//! - Publish snapshots for dashboards and pre-emptive throttling
//!
//! Health state is advisory: nothing here gates execution.

use crate::config::HealthCheckConfig;
use crate::health::state::ProviderHealth;
use crate::observability::metrics;
use crate::resilience::OperationError;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

/// Provider-supplied health check.
#[async_trait]
pub trait HealthProbe: Send + Sync {
    /// `Ok` means the provider answered a trivial request.
    async fn check(&self) -> Result<(), OperationError>;
}

/// Published health snapshots, readable by any subsystem.
#[derive(Default)]
pub struct HealthRegistry {
    entries: DashMap<String, Arc<ArcSwap<ProviderHealth>>>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, provider_id: &str) -> Arc<ArcSwap<ProviderHealth>> {
        self.entries
            .entry(provider_id.to_string())
            .or_insert_with(|| Arc::new(ArcSwap::from_pointee(ProviderHealth::unknown())))
            .clone()
    }

    /// Latest snapshot for a provider, if it has ever been probed.
    pub fn get(&self, provider_id: &str) -> Option<Arc<ProviderHealth>> {
        self.entries.get(provider_id).map(|slot| slot.load_full())
    }

    /// Snapshot of every tracked provider, sorted by id.
    pub fn all(&self) -> Vec<(String, Arc<ProviderHealth>)> {
        let mut all: Vec<_> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().load_full()))
            .collect();
        all.sort_by(|a, b| a.0.cmp(&b.0));
        all
    }
}

/// Background prober for one provider.
pub struct HealthMonitor {
    provider_id: String,
    probe: Arc<dyn HealthProbe>,
    config: HealthCheckConfig,
    slot: Arc<ArcSwap<ProviderHealth>>,
}

impl HealthMonitor {
    pub fn new(
        provider_id: &str,
        probe: Arc<dyn HealthProbe>,
        config: HealthCheckConfig,
        registry: &HealthRegistry,
    ) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            probe,
            config,
            slot: registry.slot(provider_id),
        }
    }

    /// Probe on a fixed interval until shutdown.
    pub async fn run(self, shutdown: CancellationToken) {
        if !self.config.enabled {
            tracing::info!(provider = %self.provider_id, "Health monitor disabled");
            return;
        }

        tracing::info!(
            provider = %self.provider_id,
            interval_secs = self.config.interval_secs,
            "Health monitor starting"
        );

        let mut ticker = time::interval(Duration::from_secs(self.config.interval_secs));
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = shutdown.cancelled() => {
                    tracing::info!(provider = %self.provider_id, "Health monitor shutting down");
                    break;
                }
            }
        }
    }

    /// Run one probe and publish the updated snapshot.
    pub async fn tick(&self) {
        let timeout = Duration::from_secs(self.config.timeout_secs);
        let started = Instant::now();

        let healthy = match time::timeout(timeout, self.probe.check()).await {
            Ok(Ok(())) => true,
            Ok(Err(error)) => {
                tracing::warn!(
                    provider = %self.provider_id,
                    error = %error,
                    "Health probe failed"
                );
                false
            }
            Err(_) => {
                tracing::warn!(provider = %self.provider_id, "Health probe timed out");
                false
            }
        };
        let response_time_ms = started.elapsed().as_millis() as u64;

        let previous = self.slot.load();
        let next = previous.observe(healthy, response_time_ms, &self.config);
        if next.status != previous.status {
            tracing::info!(
                provider = %self.provider_id,
                from = ?previous.status,
                to = ?next.status,
                failure_rate = next.failure_rate,
                "Provider health transition"
            );
        }
        metrics::record_provider_health(&self.provider_id, next.status.level());
        self.slot.store(Arc::new(next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::health::state::HealthStatus;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct FlakyProbe {
        healthy: AtomicBool,
    }

    #[async_trait]
    impl HealthProbe for FlakyProbe {
        async fn check(&self) -> Result<(), OperationError> {
            if self.healthy.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err("connection refused".into())
            }
        }
    }

    #[tokio::test]
    async fn test_tick_publishes_snapshots() {
        let registry = HealthRegistry::new();
        let probe = Arc::new(FlakyProbe {
            healthy: AtomicBool::new(true),
        });
        let monitor = HealthMonitor::new(
            "zephyr",
            probe.clone(),
            HealthCheckConfig::default(),
            &registry,
        );

        monitor.tick().await;
        let health = registry.get("zephyr").unwrap();
        assert_eq!(health.status, HealthStatus::Up);
        assert!(health.last_checked_ms > 0);

        probe.healthy.store(false, Ordering::SeqCst);
        monitor.tick().await;
        let health = registry.get("zephyr").unwrap();
        assert_eq!(health.status, HealthStatus::Down);
        assert!(health.failure_rate > 0.0);

        probe.healthy.store(true, Ordering::SeqCst);
        for _ in 0..5 {
            monitor.tick().await;
        }
        assert_eq!(registry.get("zephyr").unwrap().status, HealthStatus::Up);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_probe_classified_degraded() {
        struct SlowProbe;

        #[async_trait]
        impl HealthProbe for SlowProbe {
            async fn check(&self) -> Result<(), OperationError> {
                tokio::time::sleep(Duration::from_millis(3_000)).await;
                Ok(())
            }
        }

        let registry = HealthRegistry::new();
        let config = HealthCheckConfig {
            latency_threshold_ms: 2_000,
            timeout_secs: 10,
            ..HealthCheckConfig::default()
        };
        let monitor = HealthMonitor::new("qtest", Arc::new(SlowProbe), config, &registry);

        monitor.tick().await;
        assert_eq!(
            registry.get("qtest").unwrap().status,
            HealthStatus::Degraded
        );
    }

    #[tokio::test]
    async fn test_unprobed_provider_absent_from_registry() {
        let registry = HealthRegistry::new();
        assert!(registry.get("zephyr").is_none());
    }
}
