//! Read-only cost grid.

use crate::error::GridError;
use crate::models::Position;

/// Rectangular matrix of non-negative traversal costs.
///
/// `f64::INFINITY` marks a cell that can never be entered.
#[derive(Debug, Clone, PartialEq)]
pub struct CostGrid {
    height: usize,
    width: usize,
    costs: Vec<f64>,
}

impl CostGrid {
    pub fn new(rows: Vec<Vec<f64>>) -> Result<Self, GridError> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        if height == 0 || width == 0 {
            return Err(GridError::Empty);
        }

        let mut costs = Vec::with_capacity(height * width);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != width {
                return Err(GridError::Ragged {
                    row,
                    expected: width,
                    found: values.len(),
                });
            }
            for (col, value) in values.into_iter().enumerate() {
                if value.is_nan() || value < 0.0 {
                    return Err(GridError::InvalidCost { row, col, value });
                }
                costs.push(value);
            }
        }

        Ok(Self {
            height,
            width,
            costs,
        })
    }

    /// Grid of `height` x `width` cells all costing `cost`.
    pub fn uniform(height: usize, width: usize, cost: f64) -> Result<Self, GridError> {
        Self::new(vec![vec![cost; width]; height])
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn contains(&self, pos: Position) -> bool {
        pos.row < self.height && pos.col < self.width
    }

    pub fn get(&self, pos: Position) -> Option<f64> {
        if self.contains(pos) {
            Some(self.costs[pos.row * self.width + pos.col])
        } else {
            None
        }
    }

    /// Cost of an in-bounds cell.
    pub(crate) fn cost(&self, row: usize, col: usize) -> f64 {
        self.costs[row * self.width + col]
    }
}
