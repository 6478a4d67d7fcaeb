//! On-demand enumeration of candidate separating sets for a pair.

use std::collections::{BTreeSet, HashSet};

use pagoda_core::{CancellationToken, HaltReason, Variable};
use pagoda_graph::CausalGraph;

use super::subsets::Subsets;
use crate::oracle_cache::CachedOracle;

/// One tested conditioning set for a pair.
#[derive(Debug, Clone, PartialEq)]
pub struct SepsetCandidate {
    /// Sorted by name.
    pub set: Vec<Variable>,
    pub independent: bool,
    pub p_value: f64,
    pub score: Option<f64>,
}

impl SepsetCandidate {
    pub fn contains(&self, v: &Variable) -> bool {
        self.set.binary_search(v).is_ok()
    }
}

/// Test every conditioning set drawn from `adj(x) \ {y}` or from
/// `adj(y) \ {x}`, of each size from 0 up to `depth_cap`.
///
/// Sets are deduplicated by content, so a set reachable from both sides is
/// tested once. Variables in `excluded` are never conditioned on. The token is
/// polled before every test.
pub fn enumerate_candidates(
    x: &Variable,
    y: &Variable,
    graph: &CausalGraph,
    oracle: &CachedOracle<'_>,
    depth_cap: usize,
    excluded: &BTreeSet<Variable>,
    cancel: &CancellationToken,
) -> Result<Vec<SepsetCandidate>, HaltReason> {
    let side = |a: &Variable, b: &Variable| -> Vec<Variable> {
        graph
            .adjacent(a)
            .into_iter()
            .filter(|v| v != b && !excluded.contains(v))
            .collect()
    };
    let adj_x = side(x, y);
    let adj_y = side(y, x);
    let max_size = depth_cap.min(adj_x.len().max(adj_y.len()));

    let mut seen: HashSet<Vec<Variable>> = HashSet::new();
    let mut candidates = Vec::new();
    for d in 0..=max_size {
        for pool in [&adj_x, &adj_y] {
            if d > pool.len() {
                continue;
            }
            for set in Subsets::new(pool, d) {
                // Pools are sorted, so each subset already is.
                if !seen.insert(set.clone()) {
                    continue;
                }
                cancel.check()?;
                let result = oracle.test(x, y, &set);
                candidates.push(SepsetCandidate {
                    set,
                    independent: result.independent,
                    p_value: result.p_value,
                    score: result.score,
                });
            }
        }
    }
    Ok(candidates)
}
