//! Memoized subpath results shared by every worker of a search run.

use crate::models::{SubpathKey, SubpathResult};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub entries: usize,
}

/// Concurrent map from (start, end) to the solved subpath.
///
/// Shard locks are only held for a lookup or for the single insert that
/// publishes a result, never while a search runs. Two workers may race to
/// compute the same key; the first insert wins and both get that value.
#[derive(Debug, Default)]
pub struct SubpathCache {
    entries: DashMap<SubpathKey, Arc<SubpathResult>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl SubpathCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &SubpathKey) -> Option<Arc<SubpathResult>> {
        let hit = self.entries.get(key).map(|entry| Arc::clone(entry.value()));
        if hit.is_some() {
            self.hits.fetch_add(1, Ordering::Relaxed);
        }
        hit
    }

    /// Return the stored result for `key`, computing and storing it first if
    /// absent. A failed computation is returned as-is and not stored.
    pub fn get_or_compute<F, E>(&self, key: SubpathKey, compute: F) -> Result<Arc<SubpathResult>, E>
    where
        F: FnOnce() -> Result<SubpathResult, E>,
    {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let computed = Arc::new(compute()?);
        let stored = Arc::clone(&*self.entries.entry(key).or_insert(computed));
        Ok(stored)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SolveError;
    use crate::models::Position;
    use std::sync::Barrier;

    fn key(a: (usize, usize), b: (usize, usize)) -> SubpathKey {
        SubpathKey::new(Position::new(a.0, a.1), Position::new(b.0, b.1))
    }

    fn result(cost: f64) -> SubpathResult {
        SubpathResult {
            cost,
            cells: vec![Position::new(0, 0), Position::new(0, 1)],
        }
    }

    #[test]
    fn second_lookup_is_a_hit_with_identical_value() {
        let cache = SubpathCache::new();
        let first = cache
            .get_or_compute(key((0, 0), (0, 1)), || Ok::<_, SolveError>(result(2.5)))
            .unwrap();
        let second = cache
            .get_or_compute(key((0, 0), (0, 1)), || -> Result<_, SolveError> {
                panic!("must not recompute")
            })
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.cost.to_bits(), second.cost.to_bits());
        assert_eq!(
            cache.stats(),
            CacheStats {
                hits: 1,
                misses: 1,
                entries: 1
            }
        );
    }

    #[test]
    fn direction_is_part_of_the_key() {
        let cache = SubpathCache::new();
        cache
            .get_or_compute(key((0, 0), (0, 1)), || Ok::<_, SolveError>(result(1.0)))
            .unwrap();
        assert!(cache.get(&key((0, 1), (0, 0))).is_none());
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn failures_are_not_stored() {
        let cache = SubpathCache::new();
        let k = key((0, 0), (3, 3));
        let err = cache
            .get_or_compute(k, || {
                Err(SolveError::NoPathFound {
                    start: k.start,
                    end: k.end,
                })
            })
            .unwrap_err();
        assert!(matches!(err, SolveError::NoPathFound { .. }));
        assert!(cache.is_empty());
    }

    #[test]
    fn racing_writers_all_observe_the_first_insert() {
        let cache = SubpathCache::new();
        let barrier = Barrier::new(8);
        let k = key((1, 1), (4, 4));

        let results: Vec<Arc<SubpathResult>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|i| {
                    let cache = &cache;
                    let barrier = &barrier;
                    scope.spawn(move || {
                        barrier.wait();
                        cache
                            .get_or_compute(k, || Ok::<_, SolveError>(result(i as f64)))
                            .unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert_eq!(cache.len(), 1);
        let stored = cache.get(&k).unwrap();
        // A worker that lost the insert race still returns the winner.
        for value in &results {
            assert!(Arc::ptr_eq(value, &stored));
        }
    }
}
