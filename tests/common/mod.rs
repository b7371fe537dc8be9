//! Shared helpers for the integration suites.

use async_trait::async_trait;
use migration_orchestrator::catalog::{OperationDefinition, OperationId, ProviderContract};
use migration_orchestrator::executor::{Operation, OperationContext};
use migration_orchestrator::resilience::{OperationError, ResilienceError};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Scriptable provider operation: plays back a list of outcomes, then
/// repeats the last one. Tracks how many times it was invoked.
pub struct MockOp {
    id: OperationId,
    script: Mutex<Vec<Result<Value, String>>>,
    last: Result<Value, String>,
    fallback: Option<Value>,
    cancel_on_call: bool,
    pub calls: AtomicU32,
}

impl MockOp {
    pub fn ok(id: OperationId, value: Value) -> Self {
        Self::scripted(id, vec![], Ok(value))
    }

    pub fn err(id: OperationId, message: &str) -> Self {
        Self::scripted(id, vec![], Err(message.to_string()))
    }

    /// Plays `script` in order, then repeats `last` forever.
    pub fn scripted(
        id: OperationId,
        mut script: Vec<Result<Value, String>>,
        last: Result<Value, String>,
    ) -> Self {
        script.reverse();
        Self {
            id,
            script: Mutex::new(script),
            last,
            fallback: None,
            cancel_on_call: false,
            calls: AtomicU32::new(0),
        }
    }

    pub fn with_fallback(mut self, value: Value) -> Self {
        self.fallback = Some(value);
        self
    }

    /// Cancel the run's token from inside the call.
    pub fn cancelling(mut self) -> Self {
        self.cancel_on_call = true;
        self
    }

    pub fn call_count(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Operation for MockOp {
    fn id(&self) -> OperationId {
        self.id
    }

    fn fallback(&self, _error: &ResilienceError) -> Option<Value> {
        self.fallback.clone()
    }

    async fn execute(&self, ctx: &OperationContext) -> Result<Value, OperationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.cancel_on_call {
            ctx.cancellation.cancel();
        }
        let outcome = self
            .script
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| self.last.clone());
        outcome.map_err(|message| -> OperationError { message.into() })
    }
}

/// Bind mock operations by id.
pub fn bind(ops: Vec<Arc<MockOp>>) -> HashMap<OperationId, Arc<dyn Operation>> {
    ops.into_iter()
        .map(|op| (op.id(), op.clone() as Arc<dyn Operation>))
        .collect()
}

/// A small three-step contract: AUTHENTICATE → GET_PROJECTS →
/// CREATE_TEST_CASE, all required.
pub fn migration_contract() -> ProviderContract {
    ProviderContract::new("qtest")
        .with_operation(
            OperationDefinition::new(OperationId::Authenticate)
                .required(true)
                .params(["apiToken"]),
        )
        .with_operation(
            OperationDefinition::new(OperationId::GetProjects)
                .depends_on([OperationId::Authenticate])
                .required(true),
        )
        .with_operation(
            OperationDefinition::new(OperationId::CreateTestCase)
                .depends_on([OperationId::GetProjects])
                .required(true)
                .params(["projectId", "name"]),
        )
}
