//! Scratch-directory trace of a search run.

use chrono::{DateTime, Utc};
use gridroute_core::{
    format_paths, CandidatePath, Graph, NodeIndex, RouteEvaluation, SearchConfig, SearchObserver,
    SolveError, SubpathResult,
};
use serde::Serialize;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::PathBuf;

/// Parameters of the traced run, written as `manifest.json`.
#[derive(Debug, Clone, Serialize)]
pub struct Manifest {
    pub grid: PathBuf,
    pub nodes: PathBuf,
    pub start: NodeIndex,
    pub dest: NodeIndex,
    pub config: SearchConfig,
    pub workers: usize,
    pub created_at: DateTime<Utc>,
}

/// Writes intermediate artefacts of a run into a scratch directory.
///
/// Observer callbacks run on worker tasks; write failures there are logged
/// and never fail the search.
#[derive(Debug, Clone)]
pub struct ScratchTrace {
    dir: PathBuf,
}

impl ScratchTrace {
    pub fn create(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn write_manifest(&self, manifest: &Manifest) -> io::Result<()> {
        let json = serde_json::to_string_pretty(manifest)?;
        self.write("manifest.json", &json)
    }

    /// `nodes.txt` and `edges.txt`.
    pub fn write_graph(&self, graph: &Graph) -> io::Result<()> {
        self.write("nodes.txt", &graph.format_nodes())?;
        self.write("edges.txt", &graph.format_adjacency())
    }

    pub fn write_paths(&self, name: &str, paths: &[CandidatePath]) -> io::Result<()> {
        self.write(name, &format_paths(paths))
    }

    /// Remove everything inside the scratch directory, keeping the directory.
    pub fn clear(&self) -> io::Result<()> {
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.is_dir() {
                fs::remove_dir_all(&path)?;
            } else {
                fs::remove_file(&path)?;
            }
        }
        Ok(())
    }

    fn write(&self, name: &str, contents: &str) -> io::Result<()> {
        fs::write(self.dir.join(name), contents)
    }

    fn write_route(&self, index: usize, nodes: &[NodeIndex]) -> io::Result<()> {
        self.write(&format!("route_{index}.txt"), &format_paths(&[nodes.to_vec()]))
    }

    fn write_subpath(&self, route: usize, subpath: usize, result: &SubpathResult) -> io::Result<()> {
        self.write(&format!("subpath_{route}_{subpath}.txt"), &format_subpath(result))
    }

    fn record_evaluation(&self, route: &RouteEvaluation) -> io::Result<()> {
        self.write_route(route.index, &route.nodes)?;
        for (subpath, result) in route.subpaths.iter().enumerate() {
            self.write_subpath(route.index, subpath, result)?;
        }
        Ok(())
    }
}

impl SearchObserver for ScratchTrace {
    fn route_evaluated(&self, route: &RouteEvaluation) {
        if let Err(err) = self.record_evaluation(route) {
            tracing::warn!(route = route.index, dir = %self.dir.display(), error = %err, "failed to write route trace");
        }
    }

    fn route_infeasible(&self, route: usize, nodes: &[NodeIndex], _error: &SolveError) {
        if let Err(err) = self.write_route(route, nodes) {
            tracing::warn!(route, dir = %self.dir.display(), error = %err, "failed to write route trace");
        }
    }
}

/// Cost on the first line, then one `row col` line per cell after the start.
pub fn format_subpath(result: &SubpathResult) -> String {
    let mut out = format!("{}\n", result.cost);
    for cell in result.cells.iter().skip(1) {
        let _ = writeln!(out, "{} {}", cell.row, cell.col);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridroute_core::Position;

    #[test]
    fn subpath_file_skips_start_cell() {
        let result = SubpathResult {
            cost: 3.5,
            cells: vec![Position::new(0, 0), Position::new(1, 1), Position::new(1, 2)],
        };
        assert_eq!(format_subpath(&result), "3.5\n1 1\n1 2\n");
    }
}
