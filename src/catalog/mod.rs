//! Operation catalog subsystem.
//!
//! # Data Flow
//! ```text
//! Provider adapter authors a contract (contract.rs)
//!     → validation.rs checks it (all defects at once, pure, no I/O)
//!     → providers.rs registers it at startup
//!     → graph/resolver consumes it to plan a run
//! ```

pub mod contract;
pub mod operation;
pub mod providers;
pub mod validation;

pub use contract::{OperationDefinition, ProviderContract};
pub use operation::{OperationId, UnknownOperationType};
pub use providers::ContractRegistry;
pub use validation::{validate, ValidationError};
