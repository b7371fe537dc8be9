//! Health monitoring subsystem.
//!
//! # Data Flow
//! ```text
//! HealthMonitor (one per provider, monitor.rs):
//!     Periodic timer
//!     → probe the provider with a timeout
//!     → fold outcome into ProviderHealth (state.rs)
//!     → publish snapshot via HealthRegistry
//! ```
//!
//! # Design Decisions
//! - One monitor task per provider; a slow probe cannot starve others
//! - Snapshots are immutable and swapped atomically
//! - Advisory only: the monitor informs dashboards and throttling, it
//!   never blocks the executor

pub mod monitor;
pub mod state;

pub use monitor::{HealthMonitor, HealthProbe, HealthRegistry};
pub use state::{HealthStatus, ProviderHealth};
