//! Directed dependency graph over operation identifiers.
//!
//! # Responsibilities
//! - Hold nodes and dependency→dependent edges in an index arena
//! - Detect cycles and report the full cycle path
//! - Produce the canonical topological order
//!
//! # Design Decisions
//! - Arena of integer indices + adjacency lists, no pointer-like references
//! - Kahn's algorithm with a lexicographic tie-break on the wire name, so
//!   the order is identical across runs and map iteration orders
//! - A cyclic graph never yields a partial order

use crate::catalog::operation::OperationId;
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use thiserror::Error;

/// Errors surfaced by graph queries.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("circular dependency: {}", format_cycle(.0))]
    CircularDependency(Vec<OperationId>),

    #[error("operation {0} is not a node in the graph")]
    UnknownNode(OperationId),
}

fn format_cycle(cycle: &[OperationId]) -> String {
    cycle
        .iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Directed graph where an edge `a -> b` means "b depends on a".
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<OperationId>,
    index: HashMap<OperationId, usize>,
    /// edges_out[i] = nodes that depend on nodes[i].
    edges_out: Vec<Vec<usize>>,
    /// edges_in[i] = nodes that nodes[i] depends on.
    edges_in: Vec<Vec<usize>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Adding an existing node is a no-op.
    pub fn add_node(&mut self, id: OperationId) {
        if !self.index.contains_key(&id) {
            self.index.insert(id, self.nodes.len());
            self.nodes.push(id);
            self.edges_out.push(Vec::new());
            self.edges_in.push(Vec::new());
        }
    }

    /// Add an edge from `dependency` to `dependent`. Both nodes are created
    /// if absent; duplicate edges are ignored.
    pub fn add_edge(&mut self, dependency: OperationId, dependent: OperationId) {
        self.add_node(dependency);
        self.add_node(dependent);
        let from = self.index[&dependency];
        let to = self.index[&dependent];
        if !self.edges_out[from].contains(&to) {
            self.edges_out[from].push(to);
            self.edges_in[to].push(from);
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, id: OperationId) -> bool {
        self.index.contains_key(&id)
    }

    /// Iterate all nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = OperationId> + '_ {
        self.nodes.iter().copied()
    }

    /// Iterate all edges as (dependency, dependent) pairs.
    pub fn edges(&self) -> impl Iterator<Item = (OperationId, OperationId)> + '_ {
        self.edges_out.iter().enumerate().flat_map(move |(from, outs)| {
            outs.iter()
                .map(move |&to| (self.nodes[from], self.nodes[to]))
        })
    }

    /// Direct dependencies of `id` (sorted by wire name).
    pub fn dependencies_of(&self, id: OperationId) -> Result<Vec<OperationId>, GraphError> {
        let idx = *self.index.get(&id).ok_or(GraphError::UnknownNode(id))?;
        let mut deps: Vec<OperationId> =
            self.edges_in[idx].iter().map(|&i| self.nodes[i]).collect();
        deps.sort_by_key(|d| d.as_str());
        Ok(deps)
    }

    /// Direct dependents of `id` (sorted by wire name).
    pub fn dependents_of(&self, id: OperationId) -> Result<Vec<OperationId>, GraphError> {
        let idx = *self.index.get(&id).ok_or(GraphError::UnknownNode(id))?;
        let mut deps: Vec<OperationId> =
            self.edges_out[idx].iter().map(|&i| self.nodes[i]).collect();
        deps.sort_by_key(|d| d.as_str());
        Ok(deps)
    }

    /// Whether the graph contains at least one cycle.
    pub fn has_cycle(&self) -> bool {
        self.find_cycle().is_some()
    }

    /// Find one cycle and return its full path, first node repeated last
    /// (`A -> B -> C -> A` yields `[A, B, C, A]`).
    ///
    /// Three-color depth-first search: white = unvisited, gray = on the
    /// current DFS stack, black = finished. A gray-to-gray edge is a back
    /// edge and closes a cycle.
    pub fn find_cycle(&self) -> Option<Vec<OperationId>> {
        #[derive(Clone, Copy, PartialEq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let n = self.nodes.len();
        let mut color = vec![Color::White; n];
        let mut stack: Vec<usize> = Vec::new();

        // Iterative DFS; frames are (node, next child position).
        for start in 0..n {
            if color[start] != Color::White {
                continue;
            }
            let mut frames: Vec<(usize, usize)> = vec![(start, 0)];
            color[start] = Color::Gray;
            stack.push(start);

            loop {
                let Some(&(node, child_pos)) = frames.last() else {
                    break;
                };
                if child_pos < self.edges_out[node].len() {
                    let next = self.edges_out[node][child_pos];
                    if let Some(frame) = frames.last_mut() {
                        frame.1 += 1;
                    }
                    match color[next] {
                        Color::White => {
                            color[next] = Color::Gray;
                            stack.push(next);
                            frames.push((next, 0));
                        }
                        Color::Gray => {
                            // Back edge: the cycle is the stack suffix from
                            // `next` plus the closing node.
                            let from = stack.iter().position(|&i| i == next).unwrap_or(0);
                            let mut cycle: Vec<OperationId> =
                                stack[from..].iter().map(|&i| self.nodes[i]).collect();
                            cycle.push(self.nodes[next]);
                            return Some(cycle);
                        }
                        Color::Black => {}
                    }
                } else {
                    color[node] = Color::Black;
                    stack.pop();
                    frames.pop();
                }
            }
        }
        None
    }

    /// Canonical topological order: every dependency precedes its
    /// dependents, and among simultaneously-ready nodes the one with the
    /// lexicographically smallest wire name runs first.
    pub fn topological_order(&self) -> Result<Vec<OperationId>, GraphError> {
        let n = self.nodes.len();
        let mut indegree: Vec<usize> = (0..n).map(|i| self.edges_in[i].len()).collect();

        // Min-heap on the wire name for the deterministic tie-break.
        let mut ready: BinaryHeap<Reverse<(&'static str, usize)>> = indegree
            .iter()
            .enumerate()
            .filter(|(_, &deg)| deg == 0)
            .map(|(i, _)| Reverse((self.nodes[i].as_str(), i)))
            .collect();

        let mut ordered = Vec::with_capacity(n);
        while let Some(Reverse((_, idx))) = ready.pop() {
            ordered.push(self.nodes[idx]);
            for &next in &self.edges_out[idx] {
                indegree[next] -= 1;
                if indegree[next] == 0 {
                    ready.push(Reverse((self.nodes[next].as_str(), next)));
                }
            }
        }

        if ordered.len() != n {
            let cycle = self
                .find_cycle()
                .expect("unsorted remainder implies a cycle");
            return Err(GraphError::CircularDependency(cycle));
        }
        Ok(ordered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use OperationId::*;

    fn chain() -> DependencyGraph {
        let mut g = DependencyGraph::new();
        g.add_edge(Authenticate, GetProjects);
        g.add_edge(GetProjects, GetTestCases);
        g
    }

    #[test]
    fn test_add_node_is_idempotent() {
        let mut g = DependencyGraph::new();
        g.add_node(Authenticate);
        g.add_node(Authenticate);
        assert_eq!(g.node_count(), 1);
    }

    #[test]
    fn test_dependencies_and_dependents() {
        let g = chain();
        assert_eq!(g.dependencies_of(GetTestCases).unwrap(), vec![GetProjects]);
        assert_eq!(g.dependents_of(Authenticate).unwrap(), vec![GetProjects]);
        assert!(g.dependencies_of(Authenticate).unwrap().is_empty());
        assert_eq!(
            g.dependencies_of(UploadAttachment),
            Err(GraphError::UnknownNode(UploadAttachment))
        );
    }

    #[test]
    fn test_topological_order_respects_edges() {
        let g = chain();
        assert_eq!(
            g.topological_order().unwrap(),
            vec![Authenticate, GetProjects, GetTestCases]
        );
    }

    #[test]
    fn test_tie_break_is_lexicographic() {
        // Two independent roots and two independent leaves: ties resolve by
        // wire name at every step.
        let mut g = DependencyGraph::new();
        g.add_edge(Authenticate, GetTestCycles);
        g.add_edge(Authenticate, GetTestCases);
        g.add_node(CreateTestCycle);
        let order = g.topological_order().unwrap();
        assert_eq!(
            order,
            vec![Authenticate, CreateTestCycle, GetTestCases, GetTestCycles]
        );
        // Deterministic across calls.
        assert_eq!(order, g.topological_order().unwrap());
    }

    #[test]
    fn test_cycle_detection_reports_full_path() {
        // A -> B -> C -> A
        let mut g = DependencyGraph::new();
        g.add_edge(Authenticate, GetProjects);
        g.add_edge(GetProjects, GetTestCases);
        g.add_edge(GetTestCases, Authenticate);

        assert!(g.has_cycle());
        let cycle = g.find_cycle().unwrap();
        assert_eq!(cycle.first(), cycle.last());
        for id in [Authenticate, GetProjects, GetTestCases] {
            assert!(cycle.contains(&id), "cycle should name {id}");
        }

        match g.topological_order() {
            Err(GraphError::CircularDependency(path)) => {
                for id in [Authenticate, GetProjects, GetTestCases] {
                    assert!(path.contains(&id));
                }
            }
            other => panic!("expected circular_dependency, got {other:?}"),
        }
    }

    #[test]
    fn test_self_loop_is_a_cycle() {
        let mut g = DependencyGraph::new();
        g.add_edge(Authenticate, Authenticate);
        let cycle = g.find_cycle().unwrap();
        assert_eq!(cycle, vec![Authenticate, Authenticate]);
    }

    #[test]
    fn test_acyclic_graph_has_no_cycle() {
        assert!(!chain().has_cycle());
        assert!(chain().find_cycle().is_none());
    }

    #[test]
    fn test_duplicate_edges_ignored() {
        let mut g = DependencyGraph::new();
        g.add_edge(Authenticate, GetProjects);
        g.add_edge(Authenticate, GetProjects);
        assert_eq!(g.edges().count(), 1);
    }
}
