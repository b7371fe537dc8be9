//! Operation executor.
//!
//! # Responsibilities
//! - Walk a resolved plan in order, one operation at a time
//! - Route every invocation through the provider's resilience runtime
//! - Apply the required/optional failure policy
//! - Stop issuing operations the moment the run is cancelled
//!
//! Completed operations are never rolled back; an aborted or failed run
//! keeps every result gathered so far.

use crate::catalog::operation::OperationId;
use crate::executor::context::{epoch_ms, OperationContext, OperationResult, RunStatus};
use crate::graph::resolver::ExecutionPlan;
use crate::observability::metrics;
use crate::resilience::runtime::ResilienceRuntime;
use crate::resilience::{BoxedValueFuture, OperationError, RefreshFn, ResilienceError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::time::Instant;

/// One provider API action, bound to whatever client it needs.
#[async_trait]
pub trait Operation: Send + Sync {
    fn id(&self) -> OperationId;

    /// Breaker class for this operation. Defaults to the operation's own
    /// wire name, giving each endpoint its own circuit.
    fn class(&self) -> &'static str {
        self.id().as_str()
    }

    /// Cache key for this invocation, if the result is cacheable.
    fn cache_key(&self, _ctx: &OperationContext) -> Option<String> {
        None
    }

    /// Substitute payload for a terminal error, if the operation has a
    /// meaningful degraded answer.
    fn fallback(&self, _error: &ResilienceError) -> Option<Value> {
        None
    }

    async fn execute(&self, ctx: &OperationContext) -> Result<Value, OperationError>;
}

/// Report of one finished (or stopped) migration run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub run_id: uuid::Uuid,
    pub provider_id: String,
    pub status: RunStatus,
    /// Results in execution order; one entry per executed operation.
    pub results: Vec<OperationResult>,
    pub started_at_ms: u64,
    pub finished_at_ms: u64,
}

impl RunReport {
    pub fn result(&self, id: OperationId) -> Option<&OperationResult> {
        self.results.iter().find(|r| r.id == id)
    }
}

/// Walks execution plans through a provider's resilience runtime.
pub struct OperationExecutor {
    runtime: Arc<ResilienceRuntime>,
}

impl OperationExecutor {
    pub fn new(runtime: Arc<ResilienceRuntime>) -> Self {
        Self { runtime }
    }

    /// Execute `plan` with the given operation bindings.
    ///
    /// The context accumulates one result per executed operation; later
    /// operations read earlier results through it.
    pub async fn run(
        &self,
        plan: &ExecutionPlan,
        ops: &HashMap<OperationId, Arc<dyn Operation>>,
        ctx: &mut OperationContext,
    ) -> RunReport {
        let started_at_ms = epoch_ms();
        let mut status = RunStatus::Running;
        let mut order: Vec<OperationId> = Vec::with_capacity(plan.operations.len());

        tracing::info!(
            run_id = %ctx.run_id,
            provider = %plan.provider_id,
            operations = plan.operations.len(),
            "Run started"
        );

        for def in &plan.operations {
            if ctx.cancellation.is_cancelled() {
                tracing::warn!(
                    run_id = %ctx.run_id,
                    at = %def.id,
                    completed = order.len(),
                    "Run cancelled, stopping before next operation"
                );
                status = RunStatus::Aborted;
                break;
            }

            let result = match ops.get(&def.id) {
                Some(op) => self.invoke(op.clone(), ctx).await,
                None => OperationResult::failure(
                    def.id,
                    format!("no operation bound for {}", def.id),
                    0,
                ),
            };

            let failed = !result.success;
            order.push(def.id);
            ctx.results.insert(def.id, result);

            if failed {
                if def.required {
                    tracing::error!(
                        run_id = %ctx.run_id,
                        operation = %def.id,
                        "Required operation failed, stopping run"
                    );
                    status = RunStatus::Failed;
                    break;
                }
                tracing::warn!(
                    run_id = %ctx.run_id,
                    operation = %def.id,
                    "Optional operation failed, continuing"
                );
            }
        }

        if status == RunStatus::Running {
            status = RunStatus::Completed;
        }

        let results: Vec<OperationResult> = order
            .iter()
            .filter_map(|id| ctx.results.get(id).cloned())
            .collect();

        tracing::info!(
            run_id = %ctx.run_id,
            status = ?status,
            executed = results.len(),
            "Run finished"
        );

        RunReport {
            run_id: ctx.run_id,
            provider_id: plan.provider_id.clone(),
            status,
            results,
            started_at_ms,
            finished_at_ms: epoch_ms(),
        }
    }

    async fn invoke(&self, op: Arc<dyn Operation>, ctx: &OperationContext) -> OperationResult {
        let id = op.id();
        let cache_key = op.cache_key(ctx);

        // The refresh task outlives this invocation, so it gets its own
        // operation handle and a snapshot of the context.
        let refresh: Option<RefreshFn> = cache_key.as_ref().map(|_| {
            let op = op.clone();
            let snapshot = ctx.clone();
            Box::new(move || -> BoxedValueFuture {
                Box::pin(async move { op.execute(&snapshot).await })
            }) as RefreshFn
        });

        let fallback = |error: &ResilienceError| op.fallback(error);

        let started = Instant::now();
        let outcome = self
            .runtime
            .execute(
                op.class(),
                &ctx.cancellation,
                cache_key.as_deref(),
                refresh,
                Some(&fallback),
                || op.execute(ctx),
            )
            .await;
        let duration_ms = started.elapsed().as_millis() as u64;

        metrics::record_operation(
            self.runtime.provider_id(),
            id.as_str(),
            outcome.is_ok(),
            duration_ms,
        );

        match outcome {
            Ok(data) => OperationResult::success(id, data, duration_ms),
            Err(error) => OperationResult::failure(id, error.to_string(), duration_ms),
        }
    }
}
