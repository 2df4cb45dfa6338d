//! Rendering of search outcomes.

use crate::models::RouteOutcome;
use std::fmt::Write as _;

/// Human-readable summary of a search outcome.
///
/// ```text
/// Lowest cost path found:
///     3 nodes: 0 1 3
///     5 grid points {row, col}:
///         {0, 0}, {0, 1}, {0, 2}, {1, 2}, {2, 2}
///     Total cost: 4
/// ```
pub fn format_text(outcome: &RouteOutcome) -> String {
    let route = match outcome {
        RouteOutcome::Found(route) => route,
        RouteOutcome::NoRoute { reason } => return format!("No route found: {reason}\n"),
    };

    let mut out = String::from("Lowest cost path found:\n");
    let _ = write!(out, "\t{} nodes:", route.nodes.len());
    for node in &route.nodes {
        let _ = write!(out, " {node}");
    }
    out.push('\n');

    let _ = writeln!(out, "\t{} grid points {{row, col}}:", route.cells.len());
    let cells: Vec<String> = route.cells.iter().map(ToString::to_string).collect();
    let _ = writeln!(out, "\t\t{}", cells.join(", "));
    let _ = writeln!(out, "\tTotal cost: {}", route.cost);
    out
}

pub fn format_json(outcome: &RouteOutcome) -> serde_json::Result<String> {
    serde_json::to_string_pretty(outcome)
}
