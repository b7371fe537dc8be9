//! Structured logging initialization.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber. Respects `RUST_LOG`; defaults to
/// info-level engine logs otherwise.
pub fn init() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "migration_orchestrator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
