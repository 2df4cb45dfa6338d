//! Grid and node file loading plus pre-search validation.
//!
//! Grid file: a `width height` line, then `height` lines of `width`
//! whitespace-separated costs (`inf` marks a wall).
//! Nodes file: a count line, then `2 * count` integers as `row col` pairs,
//! on one or more lines.

use gridroute_core::{CostGrid, Graph, GraphError, GridError, Node, NodeIndex, Position};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("grid file {path} could not be read: {source}")]
    GridUnreadable { path: PathBuf, source: io::Error },
    #[error("nodes file {path} could not be read: {source}")]
    NodesUnreadable { path: PathBuf, source: io::Error },
    #[error("{file} file, line {line}: {message}")]
    Parse {
        file: &'static str,
        line: usize,
        message: String,
    },
    #[error("node {index} has negative coordinates ({row}, {col})")]
    NegativeCoordinate { index: NodeIndex, row: i64, col: i64 },
    #[error("node {index} at {position} is outside the {height}x{width} grid")]
    NodeOutOfGrid {
        index: NodeIndex,
        position: Position,
        height: usize,
        width: usize,
    },
    #[error("{role} node {index} does not exist, {len} nodes loaded")]
    UnknownEndpoint {
        role: &'static str,
        index: NodeIndex,
        len: usize,
    },
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

impl LoadError {
    pub fn exit_code(&self) -> u8 {
        match self {
            LoadError::GridUnreadable { .. } => 40,
            LoadError::NodesUnreadable { .. } => 41,
            LoadError::NodeOutOfGrid { .. } => 90,
            _ => 2,
        }
    }
}

/// Validated inputs of one search.
#[derive(Debug)]
pub struct Input {
    pub grid: CostGrid,
    pub graph: Graph,
}

/// Load both files, overlay the nodes on the grid and build the graph.
pub fn load_input(grid_path: &Path, nodes_path: &Path, k_neighbors: usize) -> Result<Input, LoadError> {
    let grid_text = fs::read_to_string(grid_path).map_err(|source| LoadError::GridUnreadable {
        path: grid_path.to_path_buf(),
        source,
    })?;
    let nodes_text = fs::read_to_string(nodes_path).map_err(|source| LoadError::NodesUnreadable {
        path: nodes_path.to_path_buf(),
        source,
    })?;

    let grid = parse_grid(&grid_text)?;
    let nodes = parse_nodes(&nodes_text)?;
    check_overlay(&nodes, &grid)?;
    let graph = Graph::new(nodes, k_neighbors)?;

    tracing::info!(
        height = grid.height(),
        width = grid.width(),
        nodes = graph.len(),
        edges = graph.edge_count(),
        "inputs loaded"
    );
    Ok(Input { grid, graph })
}

pub fn parse_grid(text: &str) -> Result<CostGrid, LoadError> {
    let mut lines = text.lines().enumerate();
    let (_, header) = lines.next().ok_or_else(|| parse_error("grid", 1, "missing dimensions line"))?;
    let mut dims = header.split_whitespace();
    let width = parse_dimension(dims.next(), "width")?;
    let height = parse_dimension(dims.next(), "height")?;

    let mut rows = Vec::new();
    for row in 0..height {
        let (number, line) = lines
            .next()
            .ok_or_else(|| parse_error("grid", row + 2, format!("expected {height} rows, found {row}")))?;
        let values = line
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<f64>()
                    .map_err(|err| parse_error("grid", number + 1, format!("bad cost {token:?}: {err}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if values.len() != width {
            return Err(parse_error(
                "grid",
                number + 1,
                format!("expected {width} values, found {}", values.len()),
            ));
        }
        rows.push(values);
    }

    Ok(CostGrid::new(rows)?)
}

pub fn parse_nodes(text: &str) -> Result<Vec<Node>, LoadError> {
    let mut lines = text.lines().enumerate();
    let count: usize = lines
        .next()
        .and_then(|(_, line)| line.trim().parse().ok())
        .ok_or_else(|| parse_error("nodes", 1, "first line must be the node count"))?;
    let needed = count
        .checked_mul(2)
        .ok_or_else(|| parse_error("nodes", 1, format!("node count {count} is too large")))?;

    let mut coords = Vec::new();
    let mut last_line = 1;
    for (number, line) in lines {
        last_line = number + 1;
        for token in line.split_whitespace() {
            let value = token.parse::<i64>().map_err(|err| {
                parse_error("nodes", number + 1, format!("bad coordinate {token:?}: {err}"))
            })?;
            coords.push(value);
        }
    }
    if coords.len() < needed {
        return Err(parse_error(
            "nodes",
            last_line,
            format!("expected {needed} coordinates for {count} nodes, found {}", coords.len()),
        ));
    }

    coords
        .chunks_exact(2)
        .take(count)
        .enumerate()
        .map(|(index, pair)| {
            let (row, col) = (pair[0], pair[1]);
            if row < 0 || col < 0 {
                return Err(LoadError::NegativeCoordinate { index, row, col });
            }
            Ok(Node::new(index, Position::new(row as usize, col as usize)))
        })
        .collect()
}

/// Every node must sit on a grid cell.
pub fn check_overlay(nodes: &[Node], grid: &CostGrid) -> Result<(), LoadError> {
    match nodes.iter().find(|node| !grid.contains(node.position)) {
        Some(node) => Err(LoadError::NodeOutOfGrid {
            index: node.index,
            position: node.position,
            height: grid.height(),
            width: grid.width(),
        }),
        None => Ok(()),
    }
}

pub fn check_endpoints(graph: &Graph, start: NodeIndex, dest: NodeIndex) -> Result<(), LoadError> {
    for (role, index) in [("start", start), ("destination", dest)] {
        if index >= graph.len() {
            return Err(LoadError::UnknownEndpoint {
                role,
                index,
                len: graph.len(),
            });
        }
    }
    Ok(())
}

fn parse_dimension(token: Option<&str>, name: &str) -> Result<usize, LoadError> {
    let token = token.ok_or_else(|| parse_error("grid", 1, format!("missing {name}")))?;
    match token.parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(parse_error("grid", 1, format!("{name} must be a positive integer, got {token:?}"))),
    }
}

fn parse_error(file: &'static str, line: usize, message: impl Into<String>) -> LoadError {
    LoadError::Parse {
        file,
        line,
        message: message.into(),
    }
}
