//! Landmark graph with k-nearest-neighbor adjacency.

use crate::error::GraphError;
use crate::models::{Node, NodeIndex};
use std::collections::{BTreeSet, BinaryHeap};
use std::fmt::Write as _;

/// Build a symmetric adjacency by linking each node to its `k` nearest
/// neighbors (Manhattan distance, ties broken by lower index).
///
/// A node may end up with more than `k` neighbors because edges chosen by
/// other nodes are mirrored back.
pub fn build_adjacency(nodes: &[Node], k: usize) -> Vec<BTreeSet<NodeIndex>> {
    let mut adjacency = vec![BTreeSet::new(); nodes.len()];
    if k == 0 {
        return adjacency;
    }

    for (i, node) in nodes.iter().enumerate() {
        // Max-heap capped at k keeps the k smallest (distance, index) pairs.
        let mut nearest: BinaryHeap<(usize, NodeIndex)> = BinaryHeap::with_capacity(k + 1);
        for (j, other) in nodes.iter().enumerate() {
            if i == j {
                continue;
            }
            nearest.push((node.position.manhattan(other.position), j));
            if nearest.len() > k {
                nearest.pop();
            }
        }

        for (_, j) in nearest {
            adjacency[i].insert(j);
            adjacency[j].insert(i);
        }
    }

    adjacency
}

/// Landmark nodes plus their undirected adjacency.
#[derive(Debug, Clone)]
pub struct Graph {
    nodes: Vec<Node>,
    adjacency: Vec<BTreeSet<NodeIndex>>,
}

impl Graph {
    /// Build the k-nearest-neighbor graph over `nodes`.
    pub fn new(nodes: Vec<Node>, k: usize) -> Result<Self, GraphError> {
        let nodes = reindex(nodes)?;
        let adjacency = build_adjacency(&nodes, k);
        Ok(Self { nodes, adjacency })
    }

    /// Build a graph from an explicit undirected edge list.
    pub fn with_edges(nodes: Vec<Node>, edges: &[(NodeIndex, NodeIndex)]) -> Result<Self, GraphError> {
        let nodes = reindex(nodes)?;
        let len = nodes.len();
        let mut adjacency = vec![BTreeSet::new(); len];
        for &(a, b) in edges {
            for index in [a, b] {
                if index >= len {
                    return Err(GraphError::UnknownNode { index, len });
                }
            }
            if a == b {
                return Err(GraphError::SelfLoop(a));
            }
            adjacency[a].insert(b);
            adjacency[b].insert(a);
        }
        Ok(Self { nodes, adjacency })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, index: NodeIndex) -> Option<&Node> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn neighbors(&self, index: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.adjacency
            .get(index)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    /// Number of undirected edges.
    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(BTreeSet::len).sum::<usize>() / 2
    }

    pub fn has_edges(&self) -> bool {
        self.adjacency.iter().any(|set| !set.is_empty())
    }

    pub fn contains(&self, index: NodeIndex) -> Result<(), GraphError> {
        if index < self.nodes.len() {
            Ok(())
        } else {
            Err(GraphError::UnknownNode {
                index,
                len: self.nodes.len(),
            })
        }
    }

    /// One `index row col` line per node.
    pub fn format_nodes(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            let _ = writeln!(out, "{} {} {}", node.index, node.position.row, node.position.col);
        }
        out
    }

    /// One `index neighbor...` line per node.
    pub fn format_adjacency(&self) -> String {
        let mut out = String::new();
        for (index, neighbors) in self.adjacency.iter().enumerate() {
            let _ = write!(out, "{index}");
            for neighbor in neighbors {
                let _ = write!(out, " {neighbor}");
            }
            out.push('\n');
        }
        out
    }
}

/// Node indices always match their position in the sequence.
fn reindex(nodes: Vec<Node>) -> Result<Vec<Node>, GraphError> {
    if nodes.len() < 2 {
        return Err(GraphError::TooFewNodes(nodes.len()));
    }
    Ok(nodes
        .into_iter()
        .enumerate()
        .map(|(index, node)| Node::new(index, node.position))
        .collect())
}
