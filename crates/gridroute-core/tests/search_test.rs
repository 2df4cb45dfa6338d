//! End-to-end route search tests.
//!
//! Builds small graphs over hand-made cost grids and checks the selected
//! route, the no-route signals and the behavior of the shared subpath cache.

use gridroute_core::{
    CostGrid, Graph, Node, NoRouteReason, Position, RouteEvaluation, RouteOutcome, SearchConfig,
    SearchError, SearchObserver, SearchOrchestrator, SolveError,
};
use std::sync::{Arc, Mutex};

fn nodes(positions: &[(usize, usize)]) -> Vec<Node> {
    positions
        .iter()
        .enumerate()
        .map(|(i, &(row, col))| Node::new(i, Position::new(row, col)))
        .collect()
}

fn square_orchestrator(config: SearchConfig) -> SearchOrchestrator {
    let graph = Graph::new(nodes(&[(0, 0), (0, 2), (2, 0), (2, 2)]), config.k_neighbors).unwrap();
    SearchOrchestrator::new(graph, CostGrid::uniform(3, 3, 1.0).unwrap(), config)
}

#[derive(Default)]
struct Recorder {
    evaluated: Mutex<Vec<(usize, f64)>>,
    infeasible: Mutex<Vec<usize>>,
}

impl SearchObserver for Recorder {
    fn route_evaluated(&self, route: &RouteEvaluation) {
        self.evaluated.lock().unwrap().push((route.index, route.cost));
    }

    fn route_infeasible(&self, route: usize, _nodes: &[usize], _error: &SolveError) {
        self.infeasible.lock().unwrap().push(route);
    }
}

#[tokio::test]
async fn square_picks_a_two_hop_route() {
    let orchestrator = square_orchestrator(SearchConfig::default());
    let result = orchestrator.search(0, 3).await.unwrap();

    let best = result.outcome.best().expect("route expected");
    assert_eq!(best.cost, 4.0);
    // [0,1,2,3] is enumerated first, then [0,1,3]; the tie with [0,2,3]
    // goes to the earlier candidate.
    assert_eq!(best.nodes, vec![0, 1, 3]);
    assert_eq!(best.cells.len(), 5);
    assert_eq!(best.cells.first(), Some(&Position::new(0, 0)));
    assert_eq!(best.cells.last(), Some(&Position::new(2, 2)));
    assert!(best.cells.contains(&Position::new(0, 2)));

    assert_eq!(result.stats.candidates, 4);
    assert_eq!(result.stats.evaluated, 4);
    assert_eq!(result.stats.infeasible, 0);
}

#[tokio::test]
async fn isolated_destination_has_no_candidates() {
    let graph = Graph::with_edges(nodes(&[(0, 0), (0, 2), (2, 2)]), &[(0, 1)]).unwrap();
    let orchestrator = SearchOrchestrator::new(
        graph,
        CostGrid::uniform(3, 3, 1.0).unwrap(),
        SearchConfig {
            min_nodes: 2,
            ..SearchConfig::default()
        },
    );

    let result = orchestrator.search(0, 2).await.unwrap();
    assert_eq!(
        result.outcome,
        RouteOutcome::NoRoute {
            reason: NoRouteReason::NoCandidates
        }
    );
}

#[tokio::test]
async fn graph_without_edges_reports_no_edges() {
    let orchestrator = square_orchestrator(SearchConfig {
        k_neighbors: 0,
        ..SearchConfig::default()
    });
    let result = orchestrator.search(0, 3).await.unwrap();
    assert_eq!(
        result.outcome,
        RouteOutcome::NoRoute {
            reason: NoRouteReason::NoEdges
        }
    );
}

#[tokio::test]
async fn unknown_endpoint_is_an_error() {
    let orchestrator = square_orchestrator(SearchConfig::default());
    assert!(orchestrator.search(0, 9).await.is_err());
}

/// 5x5 unit grid with a wall across the top two rows of column 2.
fn walled_orchestrator() -> SearchOrchestrator {
    let inf = f64::INFINITY;
    let mut rows = vec![vec![1.0; 5]; 5];
    rows[0][2] = inf;
    rows[1][2] = inf;
    let graph = Graph::with_edges(
        nodes(&[(0, 0), (4, 0), (4, 4), (0, 4)]),
        &[(0, 3), (0, 1), (1, 2), (2, 3)],
    )
    .unwrap();
    SearchOrchestrator::new(graph, CostGrid::new(rows).unwrap(), SearchConfig::default())
}

#[tokio::test]
async fn unreachable_subpath_skips_only_that_route() {
    let recorder = Arc::new(Recorder::default());
    let orchestrator = walled_orchestrator().with_observer(recorder.clone());

    let result = orchestrator
        .find_best_route(vec![vec![0, 3], vec![0, 1, 2, 3]], 0)
        .await
        .unwrap();

    let best = result.outcome.best().expect("detour expected");
    assert_eq!(best.nodes, vec![0, 1, 2, 3]);
    assert_eq!(best.cost, 12.0);
    assert_eq!(result.stats.evaluated, 1);
    assert_eq!(result.stats.infeasible, 1);

    assert_eq!(*recorder.infeasible.lock().unwrap(), vec![0]);
    assert_eq!(*recorder.evaluated.lock().unwrap(), vec![(1, 12.0)]);
}

#[tokio::test]
async fn all_routes_unreachable_is_no_route() {
    let result = walled_orchestrator()
        .find_best_route(vec![vec![0, 3]], 0)
        .await
        .unwrap();
    assert_eq!(
        result.outcome,
        RouteOutcome::NoRoute {
            reason: NoRouteReason::AllInfeasible
        }
    );
}

#[tokio::test]
async fn subpaths_are_solved_once_per_run() {
    let orchestrator = square_orchestrator(SearchConfig {
        max_concurrent_routes: 1,
        ..SearchConfig::default()
    });
    let result = orchestrator.search(0, 3).await.unwrap();

    // 10 subpath lookups across the 4 candidates, 6 distinct directed pairs.
    let cache = result.stats.cache;
    assert_eq!(cache.entries, 6);
    assert_eq!(cache.misses, 6);
    assert_eq!(cache.hits, 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_routes_share_the_cache() {
    let orchestrator = square_orchestrator(SearchConfig::default());
    let result = orchestrator.search(0, 3).await.unwrap();

    let cache = result.stats.cache;
    assert_eq!(cache.entries, 6);
    assert_eq!(cache.hits + cache.misses, 10);
    assert!(cache.misses >= 6);
}

#[tokio::test]
async fn failed_route_stops_further_spawns() {
    // Node 1 sits off the 3x3 grid, so route 0 fails with a solver error.
    let graph = Graph::with_edges(nodes(&[(0, 0), (9, 9), (0, 2)]), &[(0, 1), (0, 2)]).unwrap();
    let recorder = Arc::new(Recorder::default());
    let orchestrator = SearchOrchestrator::new(
        graph,
        CostGrid::uniform(3, 3, 1.0).unwrap(),
        SearchConfig {
            max_concurrent_routes: 1,
            ..SearchConfig::default()
        },
    )
    .with_observer(recorder.clone());

    let err = orchestrator
        .find_best_route(vec![vec![0, 1], vec![0, 2], vec![0, 2]], 0)
        .await
        .unwrap_err();
    assert!(
        matches!(err, SearchError::Solve { route: 0, subpath: 0, .. }),
        "{err}"
    );
    assert!(recorder.evaluated.lock().unwrap().is_empty());
}

fn scattered_orchestrator() -> SearchOrchestrator {
    let rows: Vec<Vec<f64>> = (0..20)
        .map(|r| (0..20).map(|c| ((r * 7 + c * 13) % 9 + 1) as f64).collect())
        .collect();
    let graph = Graph::new(
        nodes(&[
            (0, 0),
            (3, 9),
            (6, 2),
            (8, 14),
            (11, 6),
            (13, 17),
            (16, 3),
            (19, 19),
        ]),
        3,
    )
    .unwrap();
    SearchOrchestrator::new(
        graph,
        CostGrid::new(rows).unwrap(),
        SearchConfig {
            min_nodes: 2,
            max_nodes: 6,
            ..SearchConfig::default()
        },
    )
}

fn run_with_workers(workers: usize) -> RouteOutcome {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .max_blocking_threads(workers)
        .enable_all()
        .build()
        .unwrap();
    runtime
        .block_on(scattered_orchestrator().search(0, 7))
        .unwrap()
        .outcome
}

#[test]
fn worker_count_does_not_change_the_result() {
    let serial = run_with_workers(1);
    assert!(serial.is_found());
    for workers in [2, 4, 8] {
        assert_eq!(run_with_workers(workers), serial, "{workers} workers");
    }
}
