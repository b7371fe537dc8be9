//! Graph visualization subsystem.
//!
//! Pure functions from a dependency graph (plus an optional execution
//! result overlay) to operator-facing text: a Mermaid flowchart, a
//! Graphviz DOT description, and a self-contained HTML report. No state,
//! no side effects beyond the returned strings.

pub mod dot;
pub mod html;
pub mod mermaid;

use crate::catalog::operation::OperationId;
use crate::executor::context::OperationResult;
use std::collections::HashMap;

pub use dot::render_dot;
pub use html::render_html;
pub use mermaid::render_mermaid;

/// How a node is annotated when execution results are overlaid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOutcome {
    Succeeded,
    Failed,
    /// Planned but never reached: the run failed or aborted earlier.
    Skipped,
    /// No overlay supplied, or the node was not part of the run.
    NotRun,
}

impl NodeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeOutcome::Succeeded => "succeeded",
            NodeOutcome::Failed => "failed",
            NodeOutcome::Skipped => "skipped",
            NodeOutcome::NotRun => "not_run",
        }
    }
}

/// Classify one node against an optional result overlay.
pub fn classify(
    id: OperationId,
    results: Option<&HashMap<OperationId, OperationResult>>,
) -> NodeOutcome {
    match results {
        None => NodeOutcome::NotRun,
        Some(results) => match results.get(&id) {
            Some(result) if result.success => NodeOutcome::Succeeded,
            Some(_) => NodeOutcome::Failed,
            // A non-empty overlay means a run happened and this node was
            // never reached.
            None if !results.is_empty() => NodeOutcome::Skipped,
            None => NodeOutcome::NotRun,
        },
    }
}
