//! Configuration subsystem.
//!
//! # Data Flow
//! ```text
//! engine.toml
//!     → loader.rs (read + parse)
//!     → validation.rs (semantic checks, all errors at once)
//!     → schema.rs structs injected into runtimes at construction
//! ```
//!
//! Resilience configuration is always passed explicitly into the component
//! it configures; nothing reads an ambient global table.

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    BulkheadConfig, CacheConfig, CircuitBreakerConfig, EngineConfig, HealthCheckConfig,
    ResilienceConfig, RetryConfig,
};
pub use validation::{validate_config, ConfigDefect};
