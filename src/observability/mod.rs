//! Observability subsystem.
//!
//! # Responsibilities
//! - Initialize structured logging (logging.rs)
//! - Record engine metrics behind thin helpers (metrics.rs)
//!
//! The engine records through the `metrics` facade; the host process
//! decides how (and whether) to expose them.

pub mod logging;
pub mod metrics;
