//! Pass-scoped memoization of independence tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use dashmap::DashMap;
use pagoda_core::events::{EventDispatcher, OracleFailureEvent};
use pagoda_core::{IndependenceOracle, IndependenceResult, Variable};
use serde::Serialize;

/// Canonical key of a query: unordered pair plus sorted conditioning set.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TestKey {
    a: Variable,
    b: Variable,
    z: Vec<Variable>,
}

impl TestKey {
    fn new(x: &Variable, y: &Variable, z: &[Variable]) -> Self {
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        let mut z = z.to_vec();
        z.sort();
        Self {
            a: a.clone(),
            b: b.clone(),
            z,
        }
    }
}

/// Oracle call counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OracleStats {
    pub tests_run: usize,
    pub cache_hits: usize,
    /// Tests whose oracle call failed and were treated as dependent.
    pub degraded: usize,
}

/// Wraps an oracle with a concurrent cache and failure handling.
///
/// A failed test is never fatal: it counts as "dependent" (p = 0), is logged,
/// and is reported through the event dispatcher. Safe to share across the
/// worker pool.
pub struct CachedOracle<'a> {
    oracle: &'a dyn IndependenceOracle,
    events: &'a EventDispatcher,
    cache: DashMap<TestKey, IndependenceResult>,
    tests_run: AtomicUsize,
    cache_hits: AtomicUsize,
    degraded: AtomicUsize,
}

impl<'a> CachedOracle<'a> {
    pub fn new(oracle: &'a dyn IndependenceOracle, events: &'a EventDispatcher) -> Self {
        Self {
            oracle,
            events,
            cache: DashMap::new(),
            tests_run: AtomicUsize::new(0),
            cache_hits: AtomicUsize::new(0),
            degraded: AtomicUsize::new(0),
        }
    }

    /// `x ⟂ y | z`, answered from cache when possible.
    pub fn test(&self, x: &Variable, y: &Variable, z: &[Variable]) -> IndependenceResult {
        let key = TestKey::new(x, y, z);
        if let Some(hit) = self.cache.get(&key) {
            self.cache_hits.fetch_add(1, Ordering::Relaxed);
            return *hit;
        }

        self.tests_run.fetch_add(1, Ordering::Relaxed);
        let result = match self.oracle.test(x, y, z) {
            Ok(result) => result,
            Err(error) => {
                self.degraded.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    oracle = self.oracle.name(),
                    x = %x,
                    y = %y,
                    conditioning = z.len(),
                    error = %error,
                    "independence test failed, treating as dependent"
                );
                self.events.emit_oracle_failure(&OracleFailureEvent {
                    x: x.clone(),
                    y: y.clone(),
                    conditioning: z.to_vec(),
                    error,
                });
                IndependenceResult::dependent(0.0)
            }
        };
        self.cache.insert(key, result);
        result
    }

    /// Drop cached verdicts at a pass boundary. Counters are kept.
    pub fn clear(&self) {
        self.cache.clear();
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn stats(&self) -> OracleStats {
        OracleStats {
            tests_run: self.tests_run.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
        }
    }
}
