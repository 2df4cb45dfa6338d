//! Uniform-cost search between two grid cells.
//!
//! The search is restricted to the bounding rectangle of the two cells padded
//! by one cell on every side (clamped to the grid). Paths that would need to
//! leave that rectangle are not considered.

use crate::error::SolveError;
use crate::grid::CostGrid;
use crate::models::{Position, SubpathResult};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

const DIRECTIONS: [(isize, isize); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

#[derive(Debug, Clone, Copy)]
struct FloatOrd(f64);

impl PartialEq for FloatOrd {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for FloatOrd {}

impl PartialOrd for FloatOrd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FloatOrd {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Frontier entry, ordered by (cost, row, col).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct OpenCell {
    cost: FloatOrd,
    row: usize,
    col: usize,
}

/// Inclusive cell rectangle a search may visit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchWindow {
    pub min_row: usize,
    pub max_row: usize,
    pub min_col: usize,
    pub max_col: usize,
}

impl SearchWindow {
    /// Bounding box of `a` and `b` padded by one cell, clamped to the grid.
    pub fn between(grid: &CostGrid, a: Position, b: Position) -> Self {
        Self {
            min_row: a.row.min(b.row).saturating_sub(1),
            max_row: (a.row.max(b.row) + 1).min(grid.height() - 1),
            min_col: a.col.min(b.col).saturating_sub(1),
            max_col: (a.col.max(b.col) + 1).min(grid.width() - 1),
        }
    }

    pub fn height(&self) -> usize {
        self.max_row - self.min_row + 1
    }

    pub fn width(&self) -> usize {
        self.max_col - self.min_col + 1
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        (self.min_row..=self.max_row).contains(&row) && (self.min_col..=self.max_col).contains(&col)
    }

    fn slot(&self, row: usize, col: usize) -> usize {
        (row - self.min_row) * self.width() + (col - self.min_col)
    }

    fn step(&self, row: usize, col: usize, (dr, dc): (isize, isize)) -> Option<(usize, usize)> {
        let row = row.checked_add_signed(dr)?;
        let col = col.checked_add_signed(dc)?;
        self.contains(row, col).then_some((row, col))
    }
}

/// Cheapest 8-connected traversal from `start` to `end`.
///
/// The cost of a path is the sum of the costs of every cell entered: the
/// destination is counted, the start cell is not.
pub fn solve(grid: &CostGrid, start: Position, end: Position) -> Result<SubpathResult, SolveError> {
    for pos in [start, end] {
        if !grid.contains(pos) {
            return Err(SolveError::OutOfBounds(pos));
        }
    }

    let window = SearchWindow::between(grid, start, end);
    let slots = window.height() * window.width();
    let mut best = vec![f64::INFINITY; slots];
    let mut came_from: Vec<Option<(usize, usize)>> = vec![None; slots];

    let mut open: BinaryHeap<Reverse<OpenCell>> = BinaryHeap::new();
    best[window.slot(start.row, start.col)] = 0.0;
    open.push(Reverse(OpenCell {
        cost: FloatOrd(0.0),
        row: start.row,
        col: start.col,
    }));

    let mut expanded = 0usize;
    let mut total = None;

    while let Some(Reverse(current)) = open.pop() {
        let current_cost = current.cost.0;
        if current_cost > best[window.slot(current.row, current.col)] {
            continue;
        }
        expanded += 1;

        if current.row == end.row && current.col == end.col {
            total = Some(current_cost);
            break;
        }

        for direction in DIRECTIONS {
            let Some((row, col)) = window.step(current.row, current.col, direction) else {
                continue;
            };
            let next_cost = current_cost + grid.cost(row, col);
            let slot = window.slot(row, col);
            if next_cost < best[slot] {
                best[slot] = next_cost;
                came_from[slot] = Some((current.row, current.col));
                open.push(Reverse(OpenCell {
                    cost: FloatOrd(next_cost),
                    row,
                    col,
                }));
            }
        }
    }

    let Some(cost) = total else {
        tracing::debug!(%start, %end, expanded, "search window exhausted");
        return Err(SolveError::NoPathFound { start, end });
    };

    let mut cells = vec![end];
    let mut cursor = (end.row, end.col);
    while let Some(prev) = came_from[window.slot(cursor.0, cursor.1)] {
        cells.push(Position::new(prev.0, prev.1));
        cursor = prev;
    }
    cells.reverse();

    tracing::trace!(%start, %end, cost, expanded, cells = cells.len(), "subpath solved");
    Ok(SubpathResult { cost, cells })
}
