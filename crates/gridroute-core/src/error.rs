//! Error types for graph construction, grid search and route evaluation.

use crate::models::{NodeIndex, Position};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("a graph needs at least 2 nodes, got {0}")]
    TooFewNodes(usize),
    #[error("node {index} does not exist in a graph of {len} nodes")]
    UnknownNode { index: NodeIndex, len: usize },
    #[error("edge {0} -> {0} is a self-loop")]
    SelfLoop(NodeIndex),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("cost grid must have positive dimensions")]
    Empty,
    #[error("row {row} has {found} columns, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("cell ({row}, {col}) has invalid cost {value}")]
    InvalidCost { row: usize, col: usize, value: f64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SolveError {
    #[error("no path from {start} to {end} inside the search window")]
    NoPathFound { start: Position, end: Position },
    #[error("position {0} is outside the cost grid")]
    OutOfBounds(Position),
}

/// Failures that abort a whole search run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("route {route} references node {index}, graph has {len} nodes")]
    UnknownNode {
        route: usize,
        index: NodeIndex,
        len: usize,
    },
    #[error("candidate route {0} is empty")]
    EmptyCandidate(usize),
    #[error("route {route} does not start at node {expected}")]
    WrongStart { route: usize, expected: NodeIndex },
    #[error("worker for route {route}{} failed: {message}", .subpath.map(|s| format!(" subpath {s}")).unwrap_or_default())]
    Worker {
        route: usize,
        subpath: Option<usize>,
        message: String,
    },
    #[error("grid search for route {route} subpath {subpath} failed: {source}")]
    Solve {
        route: usize,
        subpath: usize,
        #[source]
        source: SolveError,
    },
    #[error("best-route slot was poisoned by a panicking worker")]
    SlotPoisoned,
    #[error("search was cancelled before every route finished")]
    Cancelled,
}
