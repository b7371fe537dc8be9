//! Graphviz DOT rendering.

use crate::catalog::operation::OperationId;
use crate::executor::context::OperationResult;
use crate::graph::dependency_graph::DependencyGraph;
use crate::viz::{classify, NodeOutcome};
use std::collections::HashMap;
use std::fmt::Write;

fn fill_color(outcome: NodeOutcome) -> Option<&'static str> {
    match outcome {
        NodeOutcome::Succeeded => Some("palegreen"),
        NodeOutcome::Failed => Some("lightcoral"),
        NodeOutcome::Skipped => Some("lightgray"),
        NodeOutcome::NotRun => None,
    }
}

/// Render the graph as a `digraph`, one node and one edge per line,
/// sorted by wire name so the output is stable.
pub fn render_dot(
    graph: &DependencyGraph,
    results: Option<&HashMap<OperationId, OperationResult>>,
) -> String {
    let mut out = String::from("digraph operations {\n");
    out.push_str("    rankdir=TB;\n");
    out.push_str("    node [shape=box, style=filled, fillcolor=white];\n");

    let mut nodes: Vec<OperationId> = graph.nodes().collect();
    nodes.sort_by_key(|id| id.as_str());
    for id in &nodes {
        match fill_color(classify(*id, results)) {
            Some(color) => {
                let _ = writeln!(out, "    \"{}\" [fillcolor={color}];", id.as_str());
            }
            None => {
                let _ = writeln!(out, "    \"{}\";", id.as_str());
            }
        }
    }

    let mut edges: Vec<(OperationId, OperationId)> = graph.edges().collect();
    edges.sort_by_key(|(from, to)| (from.as_str(), to.as_str()));
    for (from, to) in &edges {
        let _ = writeln!(out, "    \"{}\" -> \"{}\";", from.as_str(), to.as_str());
    }

    out.push_str("}\n");
    out
}
