//! Parallel evaluation of candidate routes.
//!
//! Every candidate route runs as its own task; inside a route, every
//! consecutive node pair is solved on the blocking pool through the run's
//! shared [`SubpathCache`]. Completed routes compete for a single
//! mutex-guarded best-route slot.

use crate::cache::{CacheStats, SubpathCache};
use crate::config::SearchConfig;
use crate::error::{GraphError, SearchError, SolveError};
use crate::graph::Graph;
use crate::grid::CostGrid;
use crate::models::{
    CandidatePath, NodeIndex, NoRouteReason, Position, RouteEvaluation, RouteOutcome, SubpathKey,
    SubpathResult,
};
use crate::paths;
use crate::solver::solve;
use futures::future::join_all;
use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};

/// Hook for tracing intermediate results of a run.
///
/// Called from worker tasks, possibly concurrently.
pub trait SearchObserver: Send + Sync {
    fn route_evaluated(&self, _route: &RouteEvaluation) {}

    fn route_infeasible(&self, _route: usize, _nodes: &[NodeIndex], _error: &SolveError) {}
}

#[derive(Debug, Default)]
pub struct NoopObserver;

impl SearchObserver for NoopObserver {}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub candidates: usize,
    pub evaluated: usize,
    pub infeasible: usize,
    pub cache: CacheStats,
}

#[derive(Debug, Clone)]
pub struct SearchResult {
    pub outcome: RouteOutcome,
    pub stats: SearchStats,
}

enum RouteStatus {
    Evaluated,
    Infeasible,
}

pub struct SearchOrchestrator {
    graph: Arc<Graph>,
    grid: Arc<CostGrid>,
    config: SearchConfig,
    observer: Arc<dyn SearchObserver>,
}

impl SearchOrchestrator {
    pub fn new(graph: Graph, grid: CostGrid, config: SearchConfig) -> Self {
        Self {
            graph: Arc::new(graph),
            grid: Arc::new(grid),
            config,
            observer: Arc::new(NoopObserver),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SearchObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Candidate paths between two nodes under the configured node bounds.
    pub fn candidates(&self, start: NodeIndex, dest: NodeIndex) -> Result<Vec<CandidatePath>, GraphError> {
        paths::enumerate(
            &self.graph,
            start,
            dest,
            self.config.min_nodes,
            self.config.max_nodes,
        )
    }

    /// Enumerate candidates between `start` and `dest`, then evaluate them.
    pub async fn search(&self, start: NodeIndex, dest: NodeIndex) -> Result<SearchResult, SearchError> {
        if !self.graph.has_edges() {
            self.graph.contains(start)?;
            self.graph.contains(dest)?;
            tracing::info!("graph has no edges, no route possible");
            return Ok(no_route(NoRouteReason::NoEdges, 0));
        }
        let candidates = self.candidates(start, dest)?;
        self.find_best_route(candidates, start).await
    }

    /// Evaluate every candidate in parallel and keep the cheapest.
    ///
    /// Equal costs are resolved in favor of the lower candidate index, so the
    /// result does not depend on worker count or completion order.
    pub async fn find_best_route(
        &self,
        candidates: Vec<CandidatePath>,
        start: NodeIndex,
    ) -> Result<SearchResult, SearchError> {
        let start_pos = self
            .graph
            .node(start)
            .map(|node| node.position)
            .ok_or(GraphError::UnknownNode {
                index: start,
                len: self.graph.len(),
            })?;

        if !self.graph.has_edges() {
            tracing::info!("graph has no edges, no route possible");
            return Ok(no_route(NoRouteReason::NoEdges, candidates.len()));
        }
        if candidates.is_empty() {
            tracing::info!(start, "no candidate paths within node bounds");
            return Ok(no_route(NoRouteReason::NoCandidates, 0));
        }
        for (index, nodes) in candidates.iter().enumerate() {
            self.check_candidate(index, nodes, start)?;
        }

        let run = Arc::new(Run {
            graph: Arc::clone(&self.graph),
            grid: Arc::clone(&self.grid),
            observer: Arc::clone(&self.observer),
            cache: SubpathCache::new(),
            best: Mutex::new(None),
        });
        let mut stats = SearchStats {
            candidates: candidates.len(),
            ..SearchStats::default()
        };

        let permits = Arc::new(Semaphore::new(self.config.max_concurrent_routes.max(1)));
        let mut tasks = JoinSet::new();
        for (index, nodes) in candidates.into_iter().enumerate() {
            let permit = Arc::clone(&permits)
                .acquire_owned()
                .await
                .map_err(|_| SearchError::Cancelled)?;
            // Settle routes that already finished so a failure stops spawning.
            while let Some(joined) = tasks.try_join_next() {
                if let Err(err) = settle(&mut stats, joined) {
                    tasks.abort_all();
                    return Err(err);
                }
            }
            let run = Arc::clone(&run);
            tasks.spawn(async move {
                let _permit = permit;
                let result = AssertUnwindSafe(run.evaluate(index, nodes))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|payload| {
                        Err(SearchError::Worker {
                            route: index,
                            subpath: None,
                            message: panic_message(payload.as_ref()),
                        })
                    });
                (index, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(err) = settle(&mut stats, joined) {
                tasks.abort_all();
                return Err(err);
            }
        }

        stats.cache = run.cache.stats();
        let best = run
            .best
            .lock()
            .map_err(|_| SearchError::SlotPoisoned)?
            .take();

        let outcome = match best {
            Some(evaluation) => {
                tracing::info!(
                    route = evaluation.index,
                    cost = evaluation.cost,
                    evaluated = stats.evaluated,
                    infeasible = stats.infeasible,
                    cache_hits = stats.cache.hits,
                    cache_misses = stats.cache.misses,
                    "best route selected"
                );
                RouteOutcome::Found(evaluation.into_best_route(start_pos))
            }
            None => {
                tracing::info!(infeasible = stats.infeasible, "every candidate route is infeasible");
                RouteOutcome::NoRoute {
                    reason: NoRouteReason::AllInfeasible,
                }
            }
        };

        Ok(SearchResult { outcome, stats })
    }

    fn check_candidate(&self, route: usize, nodes: &[NodeIndex], start: NodeIndex) -> Result<(), SearchError> {
        match nodes.first() {
            None => return Err(SearchError::EmptyCandidate(route)),
            Some(&first) if first != start => {
                return Err(SearchError::WrongStart {
                    route,
                    expected: start,
                })
            }
            Some(_) => {}
        }
        if let Some(&index) = nodes.iter().find(|&&index| index >= self.graph.len()) {
            return Err(SearchError::UnknownNode {
                route,
                index,
                len: self.graph.len(),
            });
        }
        Ok(())
    }
}

/// State shared by every task of one `find_best_route` call.
struct Run {
    graph: Arc<Graph>,
    grid: Arc<CostGrid>,
    observer: Arc<dyn SearchObserver>,
    cache: SubpathCache,
    best: Mutex<Option<RouteEvaluation>>,
}

impl Run {
    fn position(&self, index: NodeIndex) -> Position {
        self.graph.nodes()[index].position
    }

    async fn evaluate(self: Arc<Self>, index: usize, nodes: CandidatePath) -> Result<RouteStatus, SearchError> {
        let pairs = nodes.len().saturating_sub(1);
        let mut solved: Vec<Option<Arc<SubpathResult>>> = vec![None; pairs];
        let mut pending = Vec::new();

        for (subpath, pair) in nodes.windows(2).enumerate() {
            let key = SubpathKey::new(self.position(pair[0]), self.position(pair[1]));
            if let Some(hit) = self.cache.get(&key) {
                solved[subpath] = Some(hit);
                continue;
            }
            let run = Arc::clone(&self);
            let handle = tokio::task::spawn_blocking(move || {
                run.cache
                    .get_or_compute(key, || solve(&run.grid, key.start, key.end))
            });
            pending.push((subpath, handle));
        }

        let (slots, handles): (Vec<usize>, Vec<_>) = pending.into_iter().unzip();
        let joined = join_all(handles).await;

        let mut blocked = None;
        for (subpath, result) in slots.into_iter().zip(joined) {
            let result = result.map_err(|err| SearchError::Worker {
                route: index,
                subpath: Some(subpath),
                message: if err.is_panic() {
                    panic_message(err.into_panic().as_ref())
                } else {
                    err.to_string()
                },
            })?;
            match result {
                Ok(subpath_result) => solved[subpath] = Some(subpath_result),
                Err(err @ SolveError::NoPathFound { .. }) => {
                    blocked.get_or_insert(err);
                }
                Err(source) => {
                    return Err(SearchError::Solve {
                        route: index,
                        subpath,
                        source,
                    })
                }
            }
        }

        if let Some(err) = blocked {
            tracing::warn!(route = index, nodes = ?nodes, error = %err, "route skipped");
            self.observer.route_infeasible(index, &nodes, &err);
            return Ok(RouteStatus::Infeasible);
        }

        let subpaths: Vec<Arc<SubpathResult>> = solved.into_iter().flatten().collect();
        let cost: f64 = subpaths.iter().map(|subpath| subpath.cost).sum();
        let evaluation = RouteEvaluation {
            index,
            nodes,
            subpaths,
            cost,
        };
        tracing::debug!(route = index, nodes = ?evaluation.nodes, cost, "route evaluated");
        self.observer.route_evaluated(&evaluation);
        self.offer(evaluation)?;
        Ok(RouteStatus::Evaluated)
    }

    /// Compare-then-set under the slot lock.
    fn offer(&self, evaluation: RouteEvaluation) -> Result<bool, SearchError> {
        let mut best = self.best.lock().map_err(|_| SearchError::SlotPoisoned)?;
        let better = match best.as_ref() {
            None => true,
            Some(current) => {
                evaluation.cost < current.cost
                    || (evaluation.cost == current.cost && evaluation.index < current.index)
            }
        };
        if better {
            *best = Some(evaluation);
        }
        Ok(better)
    }
}

type RouteJoin = Result<(usize, Result<RouteStatus, SearchError>), JoinError>;

/// Count one finished route, or surface the error that ends the run.
fn settle(stats: &mut SearchStats, joined: RouteJoin) -> Result<(), SearchError> {
    let (index, result) = joined.map_err(|_| SearchError::Cancelled)?;
    match result {
        Ok(RouteStatus::Evaluated) => stats.evaluated += 1,
        Ok(RouteStatus::Infeasible) => stats.infeasible += 1,
        Err(err) => {
            tracing::error!(route = index, error = %err, "route evaluation failed, aborting search");
            return Err(err);
        }
    }
    Ok(())
}

fn no_route(reason: NoRouteReason, candidates: usize) -> SearchResult {
    SearchResult {
        outcome: RouteOutcome::NoRoute { reason },
        stats: SearchStats {
            candidates,
            ..SearchStats::default()
        },
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "worker panicked".to_string()
    }
}
