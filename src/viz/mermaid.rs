//! Mermaid flowchart rendering.

use crate::catalog::operation::OperationId;
use crate::executor::context::OperationResult;
use crate::graph::dependency_graph::DependencyGraph;
use crate::viz::{classify, NodeOutcome};
use std::collections::HashMap;
use std::fmt::Write;

/// Render the graph as a Mermaid `flowchart TD`.
///
/// With a result overlay, each node carries a status class
/// (`succeeded`, `failed`, `skipped`); without one, nodes are plain.
pub fn render_mermaid(
    graph: &DependencyGraph,
    results: Option<&HashMap<OperationId, OperationResult>>,
) -> String {
    let mut out = String::from("flowchart TD\n");

    let mut nodes: Vec<OperationId> = graph.nodes().collect();
    nodes.sort_by_key(|id| id.as_str());
    for id in &nodes {
        let _ = writeln!(out, "    {name}[\"{name}\"]", name = id.as_str());
    }

    let mut edges: Vec<(OperationId, OperationId)> = graph.edges().collect();
    edges.sort_by_key(|(from, to)| (from.as_str(), to.as_str()));
    for (from, to) in &edges {
        let _ = writeln!(out, "    {} --> {}", from.as_str(), to.as_str());
    }

    if results.is_some() {
        out.push('\n');
        out.push_str("    classDef succeeded fill:#c8e6c9,stroke:#2e7d32\n");
        out.push_str("    classDef failed fill:#ffcdd2,stroke:#c62828\n");
        out.push_str("    classDef skipped fill:#eeeeee,stroke:#9e9e9e\n");
        for id in &nodes {
            let outcome = classify(*id, results);
            if outcome != NodeOutcome::NotRun {
                let _ = writeln!(out, "    class {} {}", id.as_str(), outcome.as_str());
            }
        }
    }

    out
}
