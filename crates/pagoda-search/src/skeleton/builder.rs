use std::collections::{BTreeMap, BTreeSet};
use std::time::Instant;

use pagoda_core::events::{EdgeRemovedEvent, PhaseFinishedEvent, PhaseStartedEvent, SearchPhase};
use pagoda_core::{BackgroundKnowledge, HaltReason, Variable};
use pagoda_graph::{CausalGraph, Endpoint};
use tracing::{debug, info};

use crate::context::SearchContext;
use crate::oracle_cache::CachedOracle;
use crate::sepsets::{SepsetMap, Subsets};

/// Result of an adjacency search.
#[derive(Debug, Clone)]
pub struct SkeletonResult {
    /// Undirected graph (tail marks at every endpoint).
    pub graph: CausalGraph,
    pub sepsets: SepsetMap,
    /// Set when the search stopped before converging.
    pub halted: Option<HaltReason>,
    /// Largest conditioning set size fully processed.
    pub depth_reached: Option<usize>,
    pub edges_removed: usize,
}

/// An edge to remove, with the set that separated its endpoints.
#[derive(Debug, Clone)]
struct Removal {
    x: Variable,
    y: Variable,
    sepset: Vec<Variable>,
    p_value: f64,
    score: Option<f64>,
}

/// Adjacency search from the complete graph (or a supplied skeleton).
///
/// At depth `d` each remaining edge `x - y` is tested against every `d`-subset
/// of `x`'s and then `y`'s other neighbours; the first independence removes
/// the edge and records the separating set. In stable mode the neighbour
/// lists are frozen at the start of each depth and edges are evaluated in
/// parallel; otherwise adjacency is read live and edges go one at a time.
pub struct SkeletonBuilder<'a> {
    oracle: &'a CachedOracle<'a>,
    knowledge: &'a dyn BackgroundKnowledge,
    ctx: &'a SearchContext,
    depth_cap: usize,
    stable: bool,
    excluded: BTreeSet<Variable>,
}

impl<'a> SkeletonBuilder<'a> {
    pub fn new(
        oracle: &'a CachedOracle<'a>,
        knowledge: &'a dyn BackgroundKnowledge,
        ctx: &'a SearchContext,
    ) -> Self {
        Self {
            oracle,
            knowledge,
            ctx,
            depth_cap: pagoda_core::constants::MAX_DEPTH_CAP,
            stable: true,
            excluded: BTreeSet::new(),
        }
    }

    pub fn with_depth(mut self, depth_cap: usize) -> Self {
        self.depth_cap = depth_cap;
        self
    }

    pub fn with_stable(mut self, stable: bool) -> Self {
        self.stable = stable;
        self
    }

    pub fn with_excluded(mut self, excluded: BTreeSet<Variable>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Search from the complete undirected graph over `variables`.
    pub fn build(&self, variables: &[Variable]) -> SkeletonResult {
        self.build_from(CausalGraph::complete(variables, Endpoint::Tail))
    }

    /// Search starting from `initial`, whose edges are treated as undirected.
    pub fn build_from(&self, initial: CausalGraph) -> SkeletonResult {
        let started = Instant::now();
        self.ctx.events().emit_phase_started(&PhaseStartedEvent {
            phase: SearchPhase::Skeleton,
        });

        let mut graph = initial;
        graph.reorient_all_with(Endpoint::Tail);
        graph.clear_triples();
        let mut sepsets = SepsetMap::new();
        let mut edges_removed = self.remove_forbidden_pairs(&mut graph, &mut sepsets);
        let mut depth_reached = None;
        let mut halted = None;

        for depth in 0..=self.depth_cap {
            if let Err(reason) = self.ctx.check() {
                halted = Some(reason);
                break;
            }
            let (removals, halt) = if self.stable {
                self.evaluate_stable(&graph, depth)
            } else {
                self.evaluate_live(&mut graph, depth)
            };
            for removal in removals {
                if self.stable {
                    graph.remove_edge(&removal.x, &removal.y);
                }
                self.record(&mut sepsets, removal);
                edges_removed += 1;
            }
            if let Some(reason) = halt {
                halted = Some(reason);
                break;
            }
            depth_reached = Some(depth);
            debug!(depth, edges = graph.edge_count(), "skeleton depth complete");

            if !has_free_degree(&graph, depth) {
                break;
            }
        }

        info!(
            edges = graph.edge_count(),
            removed = edges_removed,
            depth = ?depth_reached,
            halted = ?halted,
            "skeleton search finished"
        );
        self.ctx.events().emit_phase_finished(&PhaseFinishedEvent {
            phase: SearchPhase::Skeleton,
            duration_ms: started.elapsed().as_millis() as u64,
        });

        SkeletonResult {
            graph,
            sepsets,
            halted,
            depth_reached,
            edges_removed,
        }
    }

    /// Remove pairs forbidden in both directions, recording an empty sepset.
    fn remove_forbidden_pairs(&self, graph: &mut CausalGraph, sepsets: &mut SepsetMap) -> usize {
        let mut removed = 0;
        for (x, y) in graph.adjacent_pairs() {
            if self.knowledge.is_forbidden(&x, &y)
                && self.knowledge.is_forbidden(&y, &x)
                && self.knowledge.no_edge_required(&x, &y)
            {
                graph.remove_edge(&x, &y);
                sepsets.set(&x, &y, Vec::new(), None);
                debug!(x = %x, y = %y, "edge removed by knowledge");
                removed += 1;
            }
        }
        removed
    }

    /// Evaluate every edge against a frozen snapshot of adjacency.
    fn evaluate_stable(
        &self,
        graph: &CausalGraph,
        depth: usize,
    ) -> (Vec<Removal>, Option<HaltReason>) {
        let snapshot: BTreeMap<Variable, Vec<Variable>> = graph
            .variables()
            .into_iter()
            .map(|v| {
                let adj = graph.adjacent(&v);
                (v, adj)
            })
            .collect();
        let pairs = graph.adjacent_pairs();
        let adjacency = |v: &Variable| snapshot.get(v).cloned().unwrap_or_default();

        let results = self
            .ctx
            .map_ordered(&pairs, |(x, y)| self.test_pair(x, y, depth, &adjacency));

        let mut removals = Vec::new();
        let mut halt = None;
        for result in results {
            match result {
                Ok(Some(removal)) => removals.push(removal),
                Ok(None) => {}
                Err(reason) => {
                    halt.get_or_insert(reason);
                }
            }
        }
        (removals, halt)
    }

    /// Evaluate edges one at a time, removing as soon as a separator is found.
    /// Returned removals are already applied to `graph`.
    fn evaluate_live(
        &self,
        graph: &mut CausalGraph,
        depth: usize,
    ) -> (Vec<Removal>, Option<HaltReason>) {
        let mut removals = Vec::new();
        for (x, y) in graph.adjacent_pairs() {
            if !graph.is_adjacent(&x, &y) {
                continue;
            }
            let adjacency = |v: &Variable| graph.adjacent(v);
            match self.test_pair(&x, &y, depth, &adjacency) {
                Ok(Some(removal)) => {
                    graph.remove_edge(&removal.x, &removal.y);
                    removals.push(removal);
                }
                Ok(None) => {}
                Err(reason) => return (removals, Some(reason)),
            }
        }
        (removals, None)
    }

    /// Look for a `depth`-sized separator of `x` and `y` among the possible
    /// parents of `x`, then of `y`.
    fn test_pair<F>(
        &self,
        x: &Variable,
        y: &Variable,
        depth: usize,
        adjacency: &F,
    ) -> Result<Option<Removal>, HaltReason>
    where
        F: Fn(&Variable) -> Vec<Variable>,
    {
        if !self.knowledge.no_edge_required(x, y) {
            return Ok(None);
        }
        for (a, b) in [(x, y), (y, x)] {
            let candidates = self.possible_parents(a, b, adjacency(a));
            if candidates.len() < depth {
                continue;
            }
            for set in Subsets::new(&candidates, depth) {
                self.ctx.check()?;
                let result = self.oracle.test(x, y, &set);
                if result.independent {
                    return Ok(Some(Removal {
                        x: x.clone(),
                        y: y.clone(),
                        sepset: set,
                        p_value: result.p_value,
                        score: result.score,
                    }));
                }
            }
        }
        Ok(None)
    }

    /// Neighbours of `a` other than `b` that knowledge allows as parents of `a`.
    fn possible_parents(&self, a: &Variable, b: &Variable, adj: Vec<Variable>) -> Vec<Variable> {
        adj.into_iter()
            .filter(|z| {
                z != b
                    && !self.excluded.contains(z)
                    && !self.knowledge.is_forbidden(z, a)
                    && !self.knowledge.is_required(a, z)
            })
            .collect()
    }

    fn record(&self, sepsets: &mut SepsetMap, removal: Removal) {
        debug!(
            x = %removal.x,
            y = %removal.y,
            sepset = %pagoda_core::variable::format_set(&removal.sepset),
            p = removal.p_value,
            "edge removed"
        );
        self.ctx.events().emit_edge_removed(&EdgeRemovedEvent {
            x: removal.x.clone(),
            y: removal.y.clone(),
            sepset: removal.sepset.clone(),
            p_value: removal.p_value,
            phase: SearchPhase::Skeleton,
        });
        sepsets.set_scored(
            &removal.x,
            &removal.y,
            removal.sepset,
            Some(removal.p_value),
            removal.score,
        );
    }
}

/// True while some edge `x - y` has more than `depth` other neighbours at an
/// endpoint, i.e. a larger conditioning set is still possible.
fn has_free_degree(graph: &CausalGraph, depth: usize) -> bool {
    graph.adjacent_pairs().iter().any(|(x, y)| {
        graph.degree(x).saturating_sub(1) > depth || graph.degree(y).saturating_sub(1) > depth
    })
}
