//! Contract validation.
//!
//! # Responsibilities
//! - Structural validation of provider contracts before resolution
//! - Report every defect at once, not just the first
//!
//! # Design Decisions
//! - Validation is a pure synchronous function, no I/O
//! - A contract that fails validation is never handed to the resolver

use crate::catalog::contract::ProviderContract;
use crate::catalog::operation::OperationId;
use crate::graph::dependency_graph::DependencyGraph;
use thiserror::Error;

/// A single contract or parameter defect.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// An operation lists a dependency that is not defined in the contract.
    #[error("operation {operation} depends on {dependency}, which is not in the contract")]
    MissingOperation {
        operation: OperationId,
        dependency: OperationId,
    },

    /// The dependency closure contains a cycle.
    #[error("circular dependency: {}", cycle.iter().map(|id| id.as_str()).collect::<Vec<_>>().join(" -> "))]
    CircularDependency { cycle: Vec<OperationId> },

    /// A required parameter is missing or malformed.
    #[error("operation {operation} is missing required parameter {parameter:?}")]
    MissingParameter {
        operation: OperationId,
        parameter: String,
    },

    /// A named contract predicate rejected the contract.
    #[error("contract predicate {predicate:?} failed: {details}")]
    ValidationFailed { predicate: String, details: String },
}

/// Build the dependency graph of a contract, skipping edges whose
/// dependency is not defined (those are reported separately).
pub fn contract_graph(contract: &ProviderContract) -> DependencyGraph {
    let mut graph = DependencyGraph::new();
    for def in contract.operations.values() {
        graph.add_node(def.id);
        for &dep in &def.dependencies {
            if contract.contains(dep) {
                graph.add_edge(dep, def.id);
            }
        }
    }
    graph
}

/// Validate a contract, returning every defect found.
pub fn validate(contract: &ProviderContract) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    // Dangling dependency references.
    for def in contract.operations.values() {
        for &dep in &def.dependencies {
            if !contract.contains(dep) {
                errors.push(ValidationError::MissingOperation {
                    operation: def.id,
                    dependency: dep,
                });
            }
        }
    }

    // Cycles in the dependency closure.
    if let Some(cycle) = contract_graph(contract).find_cycle() {
        errors.push(ValidationError::CircularDependency { cycle });
    }

    // Required operations must not declare blank parameter names.
    for def in contract.operations.values() {
        if def.required {
            for param in &def.required_params {
                if param.trim().is_empty() {
                    errors.push(ValidationError::MissingParameter {
                        operation: def.id,
                        parameter: param.clone(),
                    });
                }
            }
        }
    }

    // Provider-specific predicates.
    for (name, predicate) in &contract.predicates {
        if let Err(details) = predicate(contract) {
            errors.push(ValidationError::ValidationFailed {
                predicate: name.clone(),
                details,
            });
        }
    }

    errors
}
