//! Shipped provider contracts and the startup registry.
//!
//! Two contracts ship with the engine, for the Zephyr and qTest test
//! management providers. Both follow the same dependency discipline:
//! AUTHENTICATE gates every data-fetching operation, creation operations
//! hang off GET_PROJECTS, and attachment uploads additionally require the
//! owning test case to exist first.

use crate::catalog::contract::{OperationDefinition, ProviderContract};
use crate::catalog::operation::OperationId::*;
use crate::catalog::validation::{validate, ValidationError};
use std::collections::HashMap;

/// The Zephyr Scale provider contract.
pub fn zephyr() -> ProviderContract {
    ProviderContract::new("zephyr")
        .with_operation(
            OperationDefinition::new(Authenticate)
                .required(true)
                .params(["baseUrl", "apiToken"])
                .cost_ms(400)
                .describe("Exchange the API token for a session"),
        )
        .with_operation(
            OperationDefinition::new(GetProjects)
                .depends_on([Authenticate])
                .required(true)
                .cost_ms(600)
                .describe("List projects visible to the session"),
        )
        .with_operation(
            OperationDefinition::new(GetTestCases)
                .depends_on([Authenticate, GetProjects])
                .required(true)
                .params(["projectKey"])
                .cost_ms(2_500)
                .describe("Page through test cases of a project"),
        )
        .with_operation(
            OperationDefinition::new(GetTestCase)
                .depends_on([Authenticate, GetProjects])
                .params(["testCaseKey"])
                .cost_ms(300)
                .describe("Fetch a single test case with steps"),
        )
        .with_operation(
            OperationDefinition::new(GetTestCycles)
                .depends_on([Authenticate, GetProjects])
                .params(["projectKey"])
                .cost_ms(1_200)
                .describe("Page through test cycles of a project"),
        )
        .with_operation(
            OperationDefinition::new(GetTestExecutions)
                .depends_on([Authenticate, GetTestCycles])
                .params(["projectKey"])
                .cost_ms(3_000)
                .describe("Fetch executions for each cycle"),
        )
        .with_operation(
            OperationDefinition::new(GetAttachments)
                .depends_on([Authenticate, GetTestCases])
                .cost_ms(800)
                .describe("List attachment metadata per test case"),
        )
        .with_operation(
            OperationDefinition::new(DownloadAttachment)
                .depends_on([Authenticate, GetAttachments])
                .params(["attachmentId"])
                .cost_ms(1_500)
                .describe("Download one attachment body"),
        )
        .with_operation(
            OperationDefinition::new(CreateTestCase)
                .depends_on([Authenticate, GetProjects])
                .required(true)
                .params(["projectKey", "name"])
                .cost_ms(700)
                .describe("Create a test case in the target project"),
        )
        .with_operation(
            OperationDefinition::new(UpdateTestCase)
                .depends_on([Authenticate, CreateTestCase])
                .params(["testCaseKey"])
                .cost_ms(500)
                .describe("Patch fields on an existing test case"),
        )
        .with_operation(
            OperationDefinition::new(CreateTestCycle)
                .depends_on([Authenticate, GetProjects])
                .params(["projectKey", "name"])
                .cost_ms(600)
                .describe("Create a test cycle"),
        )
        .with_operation(
            OperationDefinition::new(CreateTestExecution)
                .depends_on([Authenticate, CreateTestCycle, CreateTestCase])
                .params(["testCycleKey", "testCaseKey"])
                .cost_ms(900)
                .describe("Record an execution against a cycle"),
        )
        .with_operation(
            OperationDefinition::new(UploadAttachment)
                .depends_on([Authenticate, GetProjects, CreateTestCase])
                .params(["testCaseKey", "fileName"])
                .cost_ms(2_000)
                .describe("Attach a file to a created test case"),
        )
        .with_operation(
            OperationDefinition::new(VerifyMigration)
                .depends_on([Authenticate, CreateTestCase])
                .cost_ms(1_000)
                .describe("Spot-check migrated entities against the source"),
        )
        .with_predicate("authenticate_gates_fetches", authenticate_gates_fetches)
}

/// The qTest provider contract.
pub fn qtest() -> ProviderContract {
    ProviderContract::new("qtest")
        .with_operation(
            OperationDefinition::new(Authenticate)
                .required(true)
                .params(["baseUrl", "username", "password"])
                .cost_ms(600)
                .describe("Obtain a bearer token"),
        )
        .with_operation(
            OperationDefinition::new(GetProjects)
                .depends_on([Authenticate])
                .required(true)
                .cost_ms(500)
                .describe("List projects for the token"),
        )
        .with_operation(
            OperationDefinition::new(GetTestCases)
                .depends_on([Authenticate, GetProjects])
                .required(true)
                .params(["projectId"])
                .cost_ms(3_000)
                .describe("Page through test cases with properties"),
        )
        .with_operation(
            OperationDefinition::new(GetTestCycles)
                .depends_on([Authenticate, GetProjects])
                .params(["projectId"])
                .cost_ms(1_000)
                .describe("Fetch the test cycle tree"),
        )
        .with_operation(
            OperationDefinition::new(GetTestExecutions)
                .depends_on([Authenticate, GetTestCycles])
                .params(["projectId"])
                .cost_ms(2_500)
                .describe("Fetch test runs and logs per cycle"),
        )
        .with_operation(
            OperationDefinition::new(GetAttachments)
                .depends_on([Authenticate, GetTestCases])
                .cost_ms(700)
                .describe("List attachments (blob handles) per test case"),
        )
        .with_operation(
            OperationDefinition::new(DownloadAttachment)
                .depends_on([Authenticate, GetAttachments])
                .params(["blobHandle"])
                .cost_ms(1_800)
                .describe("Download one attachment blob"),
        )
        .with_operation(
            OperationDefinition::new(CreateTestCase)
                .depends_on([Authenticate, GetProjects])
                .required(true)
                .params(["projectId", "name"])
                .cost_ms(800)
                .describe("Create a test case in the target project"),
        )
        .with_operation(
            OperationDefinition::new(UpdateTestCase)
                .depends_on([Authenticate, CreateTestCase])
                .params(["testCaseId"])
                .cost_ms(600)
                .describe("Update properties on a created test case"),
        )
        .with_operation(
            OperationDefinition::new(CreateTestCycle)
                .depends_on([Authenticate, GetProjects])
                .params(["projectId", "name"])
                .cost_ms(700)
                .describe("Create a test cycle under the release root"),
        )
        .with_operation(
            OperationDefinition::new(CreateTestExecution)
                .depends_on([Authenticate, CreateTestCycle, CreateTestCase])
                .params(["testCycleId", "testCaseId"])
                .cost_ms(1_000)
                .describe("Create a test run and log a result"),
        )
        .with_operation(
            OperationDefinition::new(UploadAttachment)
                .depends_on([Authenticate, GetProjects, CreateTestCase])
                .params(["testCaseId", "fileName"])
                .cost_ms(2_200)
                .describe("Attach a file to a created test case"),
        )
        .with_operation(
            OperationDefinition::new(VerifyMigration)
                .depends_on([Authenticate, CreateTestCase])
                .cost_ms(1_200)
                .describe("Spot-check migrated entities against the source"),
        )
        .with_predicate("authenticate_gates_fetches", authenticate_gates_fetches)
}

/// Every data-fetching operation must declare AUTHENTICATE among its
/// dependencies.
fn authenticate_gates_fetches(contract: &ProviderContract) -> Result<(), String> {
    let fetches = [
        GetProjects,
        GetTestCases,
        GetTestCase,
        GetTestCycles,
        GetTestExecutions,
        GetAttachments,
        DownloadAttachment,
    ];
    for id in fetches {
        if let Some(def) = contract.get(id) {
            if !def.dependencies.contains(&Authenticate) {
                return Err(format!("{id} must depend on AUTHENTICATE"));
            }
        }
    }
    Ok(())
}

/// Read-only registry of validated contracts, loaded at startup.
#[derive(Debug, Default)]
pub struct ContractRegistry {
    contracts: HashMap<String, ProviderContract>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the two shipped contracts.
    pub fn with_builtin() -> Self {
        let mut registry = Self::new();
        for contract in [zephyr(), qtest()] {
            registry
                .register(contract)
                .unwrap_or_else(|errors| panic!("builtin contract invalid: {errors:?}"));
        }
        registry
    }

    /// Register a contract after validating it. An invalid contract is
    /// rejected with every defect found.
    pub fn register(&mut self, contract: ProviderContract) -> Result<(), Vec<ValidationError>> {
        let errors = validate(&contract);
        if !errors.is_empty() {
            return Err(errors);
        }
        tracing::info!(
            provider = %contract.provider_id,
            operations = contract.operations.len(),
            "Registered provider contract"
        );
        self.contracts.insert(contract.provider_id.clone(), contract);
        Ok(())
    }

    pub fn get(&self, provider_id: &str) -> Option<&ProviderContract> {
        self.contracts.get(provider_id)
    }

    pub fn provider_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.contracts.keys().map(String::as_str).collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::operation::OperationId;

    #[test]
    fn test_builtin_contracts_validate() {
        assert!(validate(&zephyr()).is_empty());
        assert!(validate(&qtest()).is_empty());
    }

    #[test]
    fn test_registry_serves_builtin_contracts() {
        let registry = ContractRegistry::with_builtin();
        assert_eq!(registry.provider_ids(), vec!["qtest", "zephyr"]);
        assert!(registry.get("zephyr").is_some());
        assert!(registry.get("testrail").is_none());
    }

    #[test]
    fn test_registry_rejects_invalid_contract() {
        let mut registry = ContractRegistry::new();
        let broken = ProviderContract::new("broken").with_operation(
            OperationDefinition::new(OperationId::CreateTestCase)
                .depends_on([OperationId::GetProjects]),
        );
        let errors = registry.register(broken).unwrap_err();
        assert!(!errors.is_empty());
        assert!(registry.get("broken").is_none());
    }

    #[test]
    fn test_upload_attachment_depends_on_owning_case() {
        for contract in [zephyr(), qtest()] {
            let def = contract.get(OperationId::UploadAttachment).unwrap();
            assert!(def.dependencies.contains(&OperationId::GetProjects));
            assert!(def.dependencies.contains(&OperationId::CreateTestCase));
        }
    }
}
