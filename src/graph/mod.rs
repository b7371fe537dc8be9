//! Dependency graph and resolution subsystem.
//!
//! # Data Flow
//! ```text
//! Validated contract (catalog)
//!     → dependency_graph.rs (arena digraph, cycle check, canonical order)
//!     → resolver.rs (full plan, or minimal set for one target)
//!     → executor (runs the plan)
//!     → viz (renders the graph for operators)
//! ```
//!
//! # Design Decisions
//! - Graph nodes are integer indices into an arena, never references
//! - Ordering ties break on the operation's wire name, so plans are
//!   reproducible regardless of hash-map iteration order

pub mod dependency_graph;
pub mod resolver;

pub use dependency_graph::{DependencyGraph, GraphError};
pub use resolver::{
    resolve_full, resolve_target, validate_parameters, ExecutionPlan, ResolveError,
};
