//! Bounded simple-path enumeration over the landmark graph.

use crate::error::GraphError;
use crate::graph::Graph;
use crate::models::{CandidatePath, NodeIndex};
use std::fmt::Write as _;

/// Every simple path from `start` to `dest` whose node count lies in
/// `[min_nodes, max_nodes]`.
///
/// Paths stop at the first arrival at `dest`. An empty result is a normal
/// outcome, not an error.
pub fn enumerate(
    graph: &Graph,
    start: NodeIndex,
    dest: NodeIndex,
    min_nodes: usize,
    max_nodes: usize,
) -> Result<Vec<CandidatePath>, GraphError> {
    graph.contains(start)?;
    graph.contains(dest)?;

    let mut found = Vec::new();
    if min_nodes > max_nodes || max_nodes == 0 {
        return Ok(found);
    }

    let mut walker = Walker {
        graph,
        dest,
        min_nodes,
        max_nodes,
        path: Vec::with_capacity(max_nodes),
        on_path: vec![false; graph.len()],
        found: &mut found,
    };
    walker.visit(start);

    tracing::debug!(start, dest, min_nodes, max_nodes, count = found.len(), "enumerated candidate paths");
    Ok(found)
}

/// Every simple path between the two nodes, regardless of length.
pub fn all_simple_paths(
    graph: &Graph,
    start: NodeIndex,
    dest: NodeIndex,
) -> Result<Vec<CandidatePath>, GraphError> {
    enumerate(graph, start, dest, 0, graph.len())
}

/// One space-separated path per line.
pub fn format_paths(paths: &[CandidatePath]) -> String {
    let mut out = String::new();
    for path in paths {
        for node in path {
            let _ = write!(out, "{node} ");
        }
        out.push('\n');
    }
    out
}

struct Walker<'a> {
    graph: &'a Graph,
    dest: NodeIndex,
    min_nodes: usize,
    max_nodes: usize,
    path: Vec<NodeIndex>,
    on_path: Vec<bool>,
    found: &'a mut Vec<CandidatePath>,
}

impl Walker<'_> {
    fn visit(&mut self, current: NodeIndex) {
        self.path.push(current);
        self.on_path[current] = true;

        if current == self.dest {
            let len = self.path.len();
            if len >= self.min_nodes && len <= self.max_nodes {
                self.found.push(self.path.clone());
            } else {
                tracing::trace!(len, "path to destination outside node bounds");
            }
        } else if self.path.len() < self.max_nodes {
            let graph = self.graph;
            for neighbor in graph.neighbors(current) {
                if !self.on_path[neighbor] {
                    self.visit(neighbor);
                }
            }
        }

        self.on_path[current] = false;
        self.path.pop();
    }
}
