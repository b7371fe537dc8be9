//! Migration Operation Orchestration Library
//!
//! Plans and executes provider API operations for test-management
//! migrations (Zephyr, qTest): operation contracts, dependency-ordered
//! execution plans, a resilient async executor, provider health
//! monitoring, and plan/run visualization.
//!
//! ```text
//! catalog  → provider contracts and the closed operation id set
//! graph    → dependency graph, topological planning, minimal plans
//! executor → runs a plan through the resilience runtime
//! resilience → cache / circuit breaker / bulkhead / timeout / retry / fallback
//! health   → background provider probes, advisory snapshots
//! viz      → Mermaid, DOT, and HTML renderings of plans and runs
//! ```

pub mod catalog;
pub mod config;
pub mod executor;
pub mod graph;
pub mod health;
pub mod observability;
pub mod resilience;
pub mod viz;

pub use catalog::operation::OperationId;
pub use catalog::providers::ContractRegistry;
pub use config::schema::EngineConfig;
pub use executor::{OperationContext, OperationExecutor, RunReport};
pub use graph::resolver::ExecutionPlan;
pub use resilience::runtime::ResilienceRuntime;
