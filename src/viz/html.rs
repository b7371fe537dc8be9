//! Self-contained HTML report.
//!
//! Embeds the Mermaid source for client-side rendering and, when a result
//! overlay is present, a per-operation result table.

use crate::catalog::operation::OperationId;
use crate::executor::context::OperationResult;
use crate::graph::dependency_graph::DependencyGraph;
use crate::viz::mermaid::render_mermaid;
use crate::viz::{classify, NodeOutcome};
use std::collections::HashMap;
use std::fmt::Write;

const MERMAID_CDN: &str = "https://cdn.jsdelivr.net/npm/mermaid@10/dist/mermaid.min.js";

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn result_table(
    graph: &DependencyGraph,
    results: &HashMap<OperationId, OperationResult>,
) -> String {
    let mut rows = String::new();
    let mut nodes: Vec<OperationId> = graph.nodes().collect();
    nodes.sort_by_key(|id| id.as_str());

    for id in nodes {
        let outcome = classify(id, Some(results));
        let (duration, detail) = match results.get(&id) {
            Some(result) => (
                format!("{} ms", result.duration_ms),
                result.error.as_deref().unwrap_or("").to_string(),
            ),
            None => (String::from("-"), String::new()),
        };
        let _ = writeln!(
            rows,
            "      <tr class=\"{class}\"><td>{name}</td><td>{status}</td>\
             <td>{duration}</td><td>{detail}</td></tr>",
            class = outcome.as_str(),
            name = id.as_str(),
            status = outcome.as_str(),
            duration = duration,
            detail = escape(&detail),
        );
    }

    format!(
        "    <table>\n      <tr><th>Operation</th><th>Status</th>\
         <th>Duration</th><th>Error</th></tr>\n{rows}    </table>\n"
    )
}

/// Render the full report page.
pub fn render_html(
    graph: &DependencyGraph,
    results: Option<&HashMap<OperationId, OperationResult>>,
    title: &str,
) -> String {
    let diagram = render_mermaid(graph, results);
    let table = results
        .map(|results| result_table(graph, results))
        .unwrap_or_default();

    let succeeded = graph
        .nodes()
        .filter(|&id| classify(id, results) == NodeOutcome::Succeeded)
        .count();
    let summary = match results {
        Some(_) => format!(
            "<p>{succeeded} of {} operations succeeded.</p>",
            graph.node_count()
        ),
        None => format!("<p>{} operations planned.</p>", graph.node_count()),
    };

    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n  <meta charset=\"utf-8\">\n  \
         <title>{title}</title>\n  <style>\n    body {{ font-family: sans-serif; \
         margin: 2rem; }}\n    table {{ border-collapse: collapse; }}\n    \
         th, td {{ border: 1px solid #ccc; padding: 0.3rem 0.8rem; }}\n    \
         tr.succeeded td {{ background: #c8e6c9; }}\n    \
         tr.failed td {{ background: #ffcdd2; }}\n    \
         tr.skipped td {{ background: #eeeeee; }}\n  </style>\n</head>\n<body>\n  \
         <h1>{title}</h1>\n  {summary}\n  <pre class=\"mermaid\">\n{diagram}</pre>\n\
         {table}  <script src=\"{MERMAID_CDN}\"></script>\n  \
         <script>mermaid.initialize({{ startOnLoad: true }});</script>\n\
         </body>\n</html>\n",
        title = escape(title),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use OperationId::*;

    fn graph() -> DependencyGraph {
        let mut g = DependencyGraph::new();
        g.add_edge(Authenticate, GetProjects);
        g
    }

    #[test]
    fn test_plan_report_has_diagram_but_no_table() {
        let out = render_html(&graph(), None, "zephyr plan");
        assert!(out.contains("<title>zephyr plan</title>"));
        assert!(out.contains("class=\"mermaid\""));
        assert!(out.contains("2 operations planned"));
        assert!(!out.contains("<table>"));
    }

    #[test]
    fn test_run_report_includes_result_rows() {
        let mut results = HashMap::new();
        results.insert(
            Authenticate,
            OperationResult::success(Authenticate, json!({}), 7),
        );
        results.insert(
            GetProjects,
            OperationResult::failure(GetProjects, "rate limit <429>".to_string(), 41),
        );

        let out = render_html(&graph(), Some(&results), "run report");
        assert!(out.contains("1 of 2 operations succeeded"));
        assert!(out.contains("<td>AUTHENTICATE</td><td>succeeded</td>"));
        assert!(out.contains("<td>GET_PROJECTS</td><td>failed</td>"));
        // Error text is escaped.
        assert!(out.contains("rate limit &lt;429&gt;"));
        assert!(!out.contains("rate limit <429>"));
    }
}
