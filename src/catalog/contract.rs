//! Provider contract definitions.
//!
//! A contract is the declarative, per-provider description of the operations
//! the engine may run: their dependencies, whether they are required for a
//! migration to count as successful, the input parameters they need, and a
//! rough cost estimate for planning.
//!
//! Contracts are authored once per provider and are immutable after
//! construction. They carry no behavior; validation lives in
//! `catalog::validation` and ordering in `graph`.

use crate::catalog::operation::OperationId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Declaration of a single operation within a provider contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDefinition {
    /// The operation this definition describes.
    pub id: OperationId,

    /// Operations that must complete before this one may run.
    #[serde(default)]
    pub dependencies: BTreeSet<OperationId>,

    /// Whether failure of this operation is fatal to a run.
    #[serde(default)]
    pub required: bool,

    /// Input keys that must be supplied by the caller.
    #[serde(default)]
    pub required_params: BTreeSet<String>,

    /// Rough cost estimate in milliseconds, for plan summaries.
    #[serde(default)]
    pub estimated_cost_ms: u64,

    /// Human-readable description for plans and reports.
    #[serde(default)]
    pub description: String,
}

impl OperationDefinition {
    /// Create a definition with no dependencies or parameters.
    pub fn new(id: OperationId) -> Self {
        Self {
            id,
            dependencies: BTreeSet::new(),
            required: false,
            required_params: BTreeSet::new(),
            estimated_cost_ms: 0,
            description: String::new(),
        }
    }

    pub fn depends_on(mut self, deps: impl IntoIterator<Item = OperationId>) -> Self {
        self.dependencies.extend(deps);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = &'static str>) -> Self {
        self.required_params
            .extend(params.into_iter().map(|p| p.to_string()));
        self
    }

    pub fn cost_ms(mut self, ms: u64) -> Self {
        self.estimated_cost_ms = ms;
        self
    }

    pub fn describe(mut self, text: &str) -> Self {
        self.description = text.to_string();
        self
    }
}

/// A named validation predicate attached to a contract.
///
/// Predicates run after structural validation and can express
/// provider-specific rules the generic checks cannot.
pub type ContractPredicate = fn(&ProviderContract) -> Result<(), String>;

/// The full declarative surface of one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderContract {
    /// Stable provider identifier (e.g. "zephyr", "qtest").
    pub provider_id: String,

    /// Operation definitions, keyed by id. At most one per id by
    /// construction.
    pub operations: BTreeMap<OperationId, OperationDefinition>,

    /// Named validation predicates. Not serialized; re-attached by the
    /// contract author.
    #[serde(skip)]
    pub predicates: Vec<(String, ContractPredicate)>,
}

impl ProviderContract {
    pub fn new(provider_id: &str) -> Self {
        Self {
            provider_id: provider_id.to_string(),
            operations: BTreeMap::new(),
            predicates: Vec::new(),
        }
    }

    /// Add an operation definition. A later definition for the same id
    /// replaces the earlier one, preserving the one-definition-per-id
    /// invariant.
    pub fn with_operation(mut self, def: OperationDefinition) -> Self {
        self.operations.insert(def.id, def);
        self
    }

    pub fn with_predicate(mut self, name: &str, predicate: ContractPredicate) -> Self {
        self.predicates.push((name.to_string(), predicate));
        self
    }

    pub fn get(&self, id: OperationId) -> Option<&OperationDefinition> {
        self.operations.get(&id)
    }

    pub fn contains(&self, id: OperationId) -> bool {
        self.operations.contains_key(&id)
    }

    /// Total estimated cost across all operations, for plan summaries.
    pub fn estimated_total_cost_ms(&self) -> u64 {
        self.operations
            .values()
            .map(|def| def.estimated_cost_ms)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_assembles_definition() {
        let def = OperationDefinition::new(OperationId::CreateTestCase)
            .depends_on([OperationId::Authenticate, OperationId::GetProjects])
            .required(true)
            .params(["projectId", "name"])
            .cost_ms(250)
            .describe("Create a test case in the target project");

        assert_eq!(def.id, OperationId::CreateTestCase);
        assert_eq!(def.dependencies.len(), 2);
        assert!(def.required);
        assert!(def.required_params.contains("projectId"));
        assert_eq!(def.estimated_cost_ms, 250);
    }

    #[test]
    fn test_duplicate_definition_replaces() {
        let contract = ProviderContract::new("test")
            .with_operation(OperationDefinition::new(OperationId::Authenticate).cost_ms(10))
            .with_operation(OperationDefinition::new(OperationId::Authenticate).cost_ms(99));

        assert_eq!(contract.operations.len(), 1);
        assert_eq!(
            contract.get(OperationId::Authenticate).unwrap().estimated_cost_ms,
            99
        );
    }
}
