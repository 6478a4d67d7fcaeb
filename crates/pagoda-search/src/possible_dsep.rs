//! Removal of edges separated by a Possible-D-Sep set.

use std::collections::BTreeSet;
use std::time::Instant;

use pagoda_core::events::{EdgeRemovedEvent, PhaseFinishedEvent, PhaseStartedEvent, SearchPhase};
use pagoda_core::{BackgroundKnowledge, HaltReason, Variable};
use pagoda_graph::paths::possible_dsep;
use pagoda_graph::CausalGraph;
use tracing::{debug, info};

use crate::context::SearchContext;
use crate::oracle_cache::CachedOracle;
use crate::sepsets::SepsetMap;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneResult {
    pub edges_removed: usize,
    pub halted: Option<HaltReason>,
}

/// Tests each remaining edge `x - y` against Possible-D-Sep(x), then
/// Possible-D-Sep(y), computed on the graph as it currently stands.
pub struct PossibleDsepPruner<'a> {
    oracle: &'a CachedOracle<'a>,
    knowledge: &'a dyn BackgroundKnowledge,
    ctx: &'a SearchContext,
    max_path_length: usize,
    excluded: BTreeSet<Variable>,
}

impl<'a> PossibleDsepPruner<'a> {
    pub fn new(
        oracle: &'a CachedOracle<'a>,
        knowledge: &'a dyn BackgroundKnowledge,
        ctx: &'a SearchContext,
        max_path_length: usize,
    ) -> Self {
        Self {
            oracle,
            knowledge,
            ctx,
            max_path_length,
            excluded: BTreeSet::new(),
        }
    }

    pub fn with_excluded(mut self, excluded: BTreeSet<Variable>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Remove every edge whose endpoints are independent given the
    /// Possible-D-Sep set of either endpoint, recording that set.
    pub fn prune(&self, graph: &mut CausalGraph, sepsets: &mut SepsetMap) -> PruneResult {
        let started = Instant::now();
        self.ctx.events().emit_phase_started(&PhaseStartedEvent {
            phase: SearchPhase::PossibleDsep,
        });

        let mut result = PruneResult::default();
        'edges: for (x, y) in graph.adjacent_pairs() {
            if !self.knowledge.no_edge_required(&x, &y) {
                continue;
            }
            for from in [&x, &y] {
                let set: Vec<Variable> = possible_dsep(graph, from, self.max_path_length)
                    .into_iter()
                    .filter(|v| v != &x && v != &y && !self.excluded.contains(v))
                    .collect();
                if set.is_empty() {
                    continue;
                }
                if let Err(reason) = self.ctx.check() {
                    result.halted = Some(reason);
                    break 'edges;
                }
                let test = self.oracle.test(&x, &y, &set);
                if !test.independent {
                    continue;
                }
                graph.remove_edge(&x, &y);
                debug!(x = %x, y = %y, size = set.len(), "edge removed by possible-d-sep");
                self.ctx.events().emit_edge_removed(&EdgeRemovedEvent {
                    x: x.clone(),
                    y: y.clone(),
                    sepset: set.clone(),
                    p_value: test.p_value,
                    phase: SearchPhase::PossibleDsep,
                });
                sepsets.set_scored(&x, &y, set, Some(test.p_value), test.score);
                result.edges_removed += 1;
                break;
            }
        }

        info!(removed = result.edges_removed, halted = ?result.halted, "possible-d-sep pruning finished");
        self.ctx.events().emit_phase_finished(&PhaseFinishedEvent {
            phase: SearchPhase::PossibleDsep,
            duration_ms: started.elapsed().as_millis() as u64,
        });
        result
    }
}
