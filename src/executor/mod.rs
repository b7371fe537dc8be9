//! Operation execution subsystem.
//!
//! # Data Flow
//! ```text
//! ExecutionPlan (graph::resolver)
//!     + Operation bindings (provider adapters)
//!     + OperationContext (one per run)
//!     → runner.rs walks the plan through the resilience runtime
//!     → RunReport (status + ordered results)
//! ```
//!
//! # Run state machine
//! ```text
//! PENDING → RUNNING → COMPLETED   (all operations done)
//!                   → FAILED      (a required operation failed)
//!                   → ABORTED     (cancellation observed)
//! ```

pub mod context;
pub mod runner;

pub use context::{OperationContext, OperationResult, RunStatus};
pub use runner::{Operation, OperationExecutor, RunReport};
