pub mod cache;
pub mod config;
pub mod error;
pub mod graph;
pub mod grid;
pub mod models;
pub mod paths;
pub mod report;
pub mod search;
pub mod solver;

pub use cache::{CacheStats, SubpathCache};
pub use config::SearchConfig;
pub use error::{GraphError, GridError, SearchError, SolveError};
pub use graph::{build_adjacency, Graph};
pub use grid::CostGrid;
pub use models::{
    BestRoute, CandidatePath, Node, NodeIndex, NoRouteReason, Position, RouteEvaluation,
    RouteOutcome, SubpathKey, SubpathResult,
};
pub use paths::{all_simple_paths, enumerate, format_paths};
pub use report::{format_json, format_text};
pub use search::{
    NoopObserver, SearchObserver, SearchOrchestrator, SearchResult, SearchStats,
};
pub use solver::{solve, SearchWindow};
