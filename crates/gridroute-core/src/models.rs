//! Core data models shared by the graph, solver and orchestrator.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Index of a landmark node inside its [`crate::Graph`].
pub type NodeIndex = usize;

/// A simple node sequence from start to destination.
pub type CandidatePath = Vec<NodeIndex>;

/// A cell position on the cost grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// |Δrow| + |Δcol|.
    pub fn manhattan(self, other: Position) -> usize {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }
}

impl From<(usize, usize)> for Position {
    fn from((row, col): (usize, usize)) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.row, self.col)
    }
}

/// A landmark placed on the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub index: NodeIndex,
    pub position: Position,
}

impl Node {
    pub fn new(index: NodeIndex, position: Position) -> Self {
        Self { index, position }
    }
}

/// Ordered (start, end) pair identifying a subpath in the cache.
///
/// Direction matters: `a -> b` and `b -> a` are distinct keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubpathKey {
    pub start: Position,
    pub end: Position,
}

impl SubpathKey {
    pub fn new(start: Position, end: Position) -> Self {
        Self { start, end }
    }
}

/// Cheapest traversal between two grid cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubpathResult {
    pub cost: f64,
    /// Cells from start to end, both inclusive.
    pub cells: Vec<Position>,
}

/// Fully evaluated candidate route.
#[derive(Debug, Clone)]
pub struct RouteEvaluation {
    /// Position of this route in the candidate list.
    pub index: usize,
    pub nodes: CandidatePath,
    pub subpaths: Vec<Arc<SubpathResult>>,
    pub cost: f64,
}

impl RouteEvaluation {
    /// Concatenate subpath cells, keeping each shared endpoint once.
    pub fn cells(&self, start: Position) -> Vec<Position> {
        let mut cells = vec![start];
        for subpath in &self.subpaths {
            cells.extend(subpath.cells.iter().skip(1).copied());
        }
        cells
    }

    pub fn into_best_route(self, start: Position) -> BestRoute {
        let cells = self.cells(start);
        BestRoute {
            nodes: self.nodes,
            cells,
            cost: self.cost,
        }
    }
}

/// The winning route of a search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestRoute {
    pub nodes: CandidatePath,
    pub cells: Vec<Position>,
    pub cost: f64,
}

/// Why a search produced no route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoRouteReason {
    /// The graph has no edges at all.
    NoEdges,
    /// No simple path satisfies the length bounds.
    NoCandidates,
    /// Every candidate crosses an unreachable grid window.
    AllInfeasible,
}

impl fmt::Display for NoRouteReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            NoRouteReason::NoEdges => "the graph has no edges",
            NoRouteReason::NoCandidates => "no path satisfies the node count bounds",
            NoRouteReason::AllInfeasible => "every candidate path crosses an unreachable cell window",
        };
        f.write_str(text)
    }
}

/// Result of a search: a route, or an explicit "no route" signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RouteOutcome {
    Found(BestRoute),
    NoRoute { reason: NoRouteReason },
}

impl RouteOutcome {
    pub fn best(&self) -> Option<&BestRoute> {
        match self {
            RouteOutcome::Found(route) => Some(route),
            RouteOutcome::NoRoute { .. } => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, RouteOutcome::Found(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manhattan_is_symmetric() {
        let a = Position::new(1, 7);
        let b = Position::new(4, 2);
        assert_eq!(a.manhattan(b), 8);
        assert_eq!(b.manhattan(a), 8);
    }

    #[test]
    fn cells_skip_shared_endpoints() {
        let evaluation = RouteEvaluation {
            index: 0,
            nodes: vec![0, 1, 2],
            subpaths: vec![
                Arc::new(SubpathResult {
                    cost: 1.0,
                    cells: vec![Position::new(0, 0), Position::new(0, 1)],
                }),
                Arc::new(SubpathResult {
                    cost: 2.0,
                    cells: vec![Position::new(0, 1), Position::new(1, 2), Position::new(2, 2)],
                }),
            ],
            cost: 3.0,
        };

        let route = evaluation.into_best_route(Position::new(0, 0));
        assert_eq!(
            route.cells,
            vec![
                Position::new(0, 0),
                Position::new(0, 1),
                Position::new(1, 2),
                Position::new(2, 2)
            ]
        );
        assert_eq!(route.nodes, vec![0, 1, 2]);
    }

    #[test]
    fn no_route_serializes_with_reason() {
        let outcome = RouteOutcome::NoRoute {
            reason: NoRouteReason::NoCandidates,
        };
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "no_route");
        assert_eq!(json["reason"], "no_candidates");
    }
}
