//! Dependency resolver.
//!
//! Turns a validated provider contract into an ordered execution plan:
//! either the whole contract surface or the minimal operation set needed to
//! reach one target operation. Resolution is a pure function of the
//! contract, the target, and the supplied inputs; it performs no I/O and
//! touches no shared state.

use crate::catalog::contract::{OperationDefinition, ProviderContract};
use crate::catalog::operation::OperationId;
use crate::catalog::validation::{self, contract_graph, ValidationError};
use crate::graph::dependency_graph::{DependencyGraph, GraphError};
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use thiserror::Error;

/// Errors surfaced before any operation executes.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("contract for {provider_id} is invalid: {errors:?}")]
    InvalidContract {
        provider_id: String,
        errors: Vec<ValidationError>,
    },

    #[error("target operation {0} is not defined in the contract")]
    UnknownTarget(OperationId),

    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// An ordered, ready-to-execute operation plan.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionPlan {
    pub provider_id: String,

    /// The target operation, if this is a minimal-set plan.
    pub target: Option<OperationId>,

    /// Operation definitions in execution order.
    pub operations: Vec<OperationDefinition>,
}

impl ExecutionPlan {
    /// Ids in execution order.
    pub fn order(&self) -> Vec<OperationId> {
        self.operations.iter().map(|def| def.id).collect()
    }

    /// Lookup table from id to definition.
    pub fn operations_map(&self) -> HashMap<OperationId, &OperationDefinition> {
        self.operations.iter().map(|def| (def.id, def)).collect()
    }

    /// Sum of the per-operation cost estimates.
    pub fn estimated_cost_ms(&self) -> u64 {
        self.operations.iter().map(|d| d.estimated_cost_ms).sum()
    }
}

fn ensure_valid(contract: &ProviderContract) -> Result<(), ResolveError> {
    let errors = validation::validate(contract);
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ResolveError::InvalidContract {
            provider_id: contract.provider_id.clone(),
            errors,
        })
    }
}

fn plan_from_order(
    contract: &ProviderContract,
    target: Option<OperationId>,
    order: Vec<OperationId>,
) -> ExecutionPlan {
    let operations = order
        .into_iter()
        .filter_map(|id| contract.get(id).cloned())
        .collect();
    ExecutionPlan {
        provider_id: contract.provider_id.clone(),
        target,
        operations,
    }
}

/// Build the full execution order over the whole contract.
pub fn resolve_full(contract: &ProviderContract) -> Result<ExecutionPlan, ResolveError> {
    ensure_valid(contract)?;
    let order = contract_graph(contract).topological_order()?;
    Ok(plan_from_order(contract, None, order))
}

/// Build the minimal operation set needed to reach `target`: the BFS
/// transitive closure of its dependencies, topologically ordered.
/// Operations not reachable from the target are excluded even when the
/// contract defines them.
pub fn resolve_target(
    contract: &ProviderContract,
    target: OperationId,
) -> Result<ExecutionPlan, ResolveError> {
    ensure_valid(contract)?;
    if !contract.contains(target) {
        return Err(ResolveError::UnknownTarget(target));
    }

    // Breadth-first closure over declared dependencies.
    let mut needed: HashSet<OperationId> = HashSet::new();
    let mut queue: VecDeque<OperationId> = VecDeque::new();
    needed.insert(target);
    queue.push_back(target);
    while let Some(id) = queue.pop_front() {
        if let Some(def) = contract.get(id) {
            for &dep in &def.dependencies {
                if needed.insert(dep) {
                    queue.push_back(dep);
                }
            }
        }
    }

    // Topological order over the induced subgraph only, so the canonical
    // tie-break is not perturbed by unrelated siblings.
    let mut subgraph = DependencyGraph::new();
    for &id in &needed {
        subgraph.add_node(id);
        if let Some(def) = contract.get(id) {
            for &dep in &def.dependencies {
                if needed.contains(&dep) {
                    subgraph.add_edge(dep, id);
                }
            }
        }
    }
    let order = subgraph.topological_order()?;
    Ok(plan_from_order(contract, Some(target), order))
}

/// Check caller-supplied inputs against the plan: every required operation's
/// declared parameters must be present among `input_keys`. Returns every
/// missing key, not just the first.
pub fn validate_parameters<'a>(
    plan: &ExecutionPlan,
    input_keys: impl IntoIterator<Item = &'a str>,
) -> Vec<ValidationError> {
    let supplied: HashSet<&str> = input_keys.into_iter().collect();
    let mut errors = Vec::new();
    for def in &plan.operations {
        if !def.required {
            continue;
        }
        for param in &def.required_params {
            if !supplied.contains(param.as_str()) {
                errors.push(ValidationError::MissingParameter {
                    operation: def.id,
                    parameter: param.clone(),
                });
            }
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::contract::OperationDefinition;
    use crate::catalog::providers;
    use OperationId::*;

    fn chain_contract() -> ProviderContract {
        ProviderContract::new("test")
            .with_operation(
                OperationDefinition::new(Authenticate)
                    .required(true)
                    .params(["apiToken"]),
            )
            .with_operation(
                OperationDefinition::new(GetProjects)
                    .depends_on([Authenticate])
                    .required(true),
            )
            .with_operation(
                OperationDefinition::new(CreateTestCase)
                    .depends_on([GetProjects])
                    .required(true)
                    .params(["projectId", "name"]),
            )
            .with_operation(
                OperationDefinition::new(GetTestCycles).depends_on([Authenticate]),
            )
    }

    #[test]
    fn test_minimal_set_excludes_siblings() {
        let plan = resolve_target(&chain_contract(), CreateTestCase).unwrap();
        assert_eq!(
            plan.order(),
            vec![Authenticate, GetProjects, CreateTestCase]
        );
        // GET_TEST_CYCLES is in the contract but not on the path.
        assert!(!plan.order().contains(&GetTestCycles));
    }

    #[test]
    fn test_full_order_covers_whole_contract() {
        let plan = resolve_full(&chain_contract()).unwrap();
        assert_eq!(plan.operations.len(), 4);
        let order = plan.order();
        let pos = |id| order.iter().position(|&o| o == id).unwrap();
        assert!(pos(Authenticate) < pos(GetProjects));
        assert!(pos(GetProjects) < pos(CreateTestCase));
        assert!(pos(Authenticate) < pos(GetTestCycles));
    }

    #[test]
    fn test_unknown_target_rejected() {
        let err = resolve_target(&chain_contract(), UploadAttachment).unwrap_err();
        assert!(matches!(err, ResolveError::UnknownTarget(UploadAttachment)));
    }

    #[test]
    fn test_invalid_contract_rejected_before_resolution() {
        let broken = ProviderContract::new("broken").with_operation(
            OperationDefinition::new(CreateTestCase).depends_on([GetProjects]),
        );
        let err = resolve_full(&broken).unwrap_err();
        assert!(matches!(err, ResolveError::InvalidContract { .. }));
    }

    #[test]
    fn test_parameter_validation_reports_all_missing_keys() {
        let plan = resolve_target(&chain_contract(), CreateTestCase).unwrap();
        let errors = validate_parameters(&plan, ["apiToken"]);
        assert_eq!(errors.len(), 2);
        for error in &errors {
            match error {
                ValidationError::MissingParameter { operation, parameter } => {
                    assert_eq!(*operation, CreateTestCase);
                    assert!(parameter == "projectId" || parameter == "name");
                }
                other => panic!("unexpected error {other:?}"),
            }
        }

        let ok = validate_parameters(&plan, ["apiToken", "projectId", "name"]);
        assert!(ok.is_empty());
    }

    #[test]
    fn test_optional_operation_params_not_enforced() {
        let contract = chain_contract().with_operation(
            OperationDefinition::new(GetTestCycles)
                .depends_on([Authenticate])
                .params(["projectId"]),
        );
        let plan = resolve_full(&contract).unwrap();
        // GET_TEST_CYCLES is optional; its params are not required up front.
        let errors = validate_parameters(&plan, ["apiToken", "projectId", "name"]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_zephyr_create_test_case_minimal_set() {
        let plan = resolve_target(&providers::zephyr(), CreateTestCase).unwrap();
        assert_eq!(
            plan.order(),
            vec![Authenticate, GetProjects, CreateTestCase]
        );
    }

    #[test]
    fn test_full_order_is_deterministic() {
        let contract = providers::qtest();
        let first = resolve_full(&contract).unwrap().order();
        for _ in 0..5 {
            assert_eq!(resolve_full(&contract).unwrap().order(), first);
        }
    }
}
