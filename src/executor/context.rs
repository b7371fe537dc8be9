//! Run context and results.

use crate::catalog::operation::OperationId;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Milliseconds since the Unix epoch.
pub fn epoch_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Lifecycle of one migration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Aborted,
}

/// Outcome of one executed operation.
#[derive(Debug, Clone, Serialize)]
pub struct OperationResult {
    pub id: OperationId,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
    pub timestamp_ms: u64,
}

impl OperationResult {
    pub fn success(id: OperationId, data: Value, duration_ms: u64) -> Self {
        Self {
            id,
            success: true,
            data: Some(data),
            error: None,
            duration_ms,
            timestamp_ms: epoch_ms(),
        }
    }

    pub fn failure(id: OperationId, error: String, duration_ms: u64) -> Self {
        Self {
            id,
            success: false,
            data: None,
            error: Some(error),
            duration_ms,
            timestamp_ms: epoch_ms(),
        }
    }
}

/// Shared state threaded through one migration run.
///
/// Owned exclusively by the executor for that run; operations read earlier
/// results through it but never write. Results only ever grow, one slot
/// per operation.
#[derive(Debug, Clone)]
pub struct OperationContext {
    pub run_id: Uuid,

    /// Caller-supplied input parameters.
    pub input: Map<String, Value>,

    /// Results of completed operations, keyed by id.
    pub results: HashMap<OperationId, OperationResult>,

    pub source_provider: String,
    pub target_provider: String,

    /// Run-scoped cancellation token.
    pub cancellation: CancellationToken,

    /// Free-form annotations (batch ids, operator notes).
    pub metadata: HashMap<String, String>,
}

impl OperationContext {
    pub fn new(source_provider: &str, target_provider: &str, input: Map<String, Value>) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            input,
            results: HashMap::new(),
            source_provider: source_provider.to_string(),
            target_provider: target_provider.to_string(),
            cancellation: CancellationToken::new(),
            metadata: HashMap::new(),
        }
    }

    /// Data produced by an earlier operation, if it succeeded.
    pub fn result_data(&self, id: OperationId) -> Option<&Value> {
        self.results
            .get(&id)
            .filter(|r| r.success)
            .and_then(|r| r.data.as_ref())
    }

    /// Keys of the caller-supplied input.
    pub fn input_keys(&self) -> impl Iterator<Item = &str> {
        self.input.keys().map(String::as_str)
    }
}
