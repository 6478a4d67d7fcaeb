//! Decide every unshielded triple, then write the colliders.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::time::Instant;

use pagoda_core::events::{PhaseFinishedEvent, PhaseStartedEvent, SearchPhase, TripleDecidedEvent};
use pagoda_core::variable::format_set;
use pagoda_core::{BackgroundKnowledge, HaltReason, TargetKind, Variable};
use pagoda_graph::{unshielded_triples, CausalGraph, Endpoint, Triple};
use tracing::{debug, info};

use super::decision::{Application, Decision, DecisionRecord, DecisionRule};
use crate::context::SearchContext;
use crate::guards;
use crate::oracle_cache::CachedOracle;
use crate::sepsets::{enumerate_candidates, SepsetMap};

/// Result of one collider pass. Records are in sorted triple order.
#[derive(Debug, Clone, Default)]
pub struct ColliderReport {
    pub records: Vec<DecisionRecord>,
    pub halted: Option<HaltReason>,
}

impl ColliderReport {
    pub fn oriented(&self) -> usize {
        self.records
            .iter()
            .filter(|r| r.application == Application::Oriented)
            .count()
    }

    pub fn count(&self, decision: Decision) -> usize {
        self.records.iter().filter(|r| r.decision == decision).count()
    }
}

pub struct ColliderOrienter<'a> {
    rule: DecisionRule,
    target: TargetKind,
    knowledge: &'a dyn BackgroundKnowledge,
    oracle: &'a CachedOracle<'a>,
    ctx: &'a SearchContext,
    depth_cap: usize,
    excluded: BTreeSet<Variable>,
    global: bool,
    depth_stratified: bool,
}

impl<'a> ColliderOrienter<'a> {
    pub fn new(
        rule: DecisionRule,
        target: TargetKind,
        knowledge: &'a dyn BackgroundKnowledge,
        oracle: &'a CachedOracle<'a>,
        ctx: &'a SearchContext,
    ) -> Self {
        Self {
            rule,
            target,
            knowledge,
            oracle,
            ctx,
            depth_cap: pagoda_core::constants::MAX_DEPTH_CAP,
            excluded: BTreeSet::new(),
            global: false,
            depth_stratified: false,
        }
    }

    pub fn with_depth(mut self, depth_cap: usize) -> Self {
        self.depth_cap = depth_cap;
        self
    }

    pub fn with_excluded(mut self, excluded: BTreeSet<Variable>) -> Self {
        self.excluded = excluded;
        self
    }

    /// Apply max-p colliders in one global order instead of triple order.
    /// Ignored by the other rules.
    pub fn with_global_order(mut self, global: bool, depth_stratified: bool) -> Self {
        self.global = global;
        self.depth_stratified = depth_stratified;
        self
    }

    pub fn rule(&self) -> DecisionRule {
        self.rule
    }

    /// Decide a single triple against the current graph.
    pub fn decide(
        &self,
        triple: &Triple,
        graph: &CausalGraph,
        sepsets: &SepsetMap,
    ) -> Result<DecisionRecord, HaltReason> {
        if !self.rule.needs_candidates() {
            return Ok(DecisionRule::decide_from_sepset(triple, sepsets));
        }
        let candidates = enumerate_candidates(
            &triple.x,
            &triple.y,
            graph,
            self.oracle,
            self.depth_cap,
            &self.excluded,
            self.ctx.cancellation(),
        )?;
        Ok(self.rule.decide_from_candidates(triple, &candidates))
    }

    /// Decide all unshielded triples of `graph` (in parallel when the
    /// context has a pool) and apply them single-threaded.
    pub fn orient(&self, graph: &mut CausalGraph, sepsets: &SepsetMap) -> ColliderReport {
        let started = Instant::now();
        self.ctx.events().emit_phase_started(&PhaseStartedEvent {
            phase: SearchPhase::Colliders,
        });

        let triples = unshielded_triples(graph);
        let decided = {
            let snapshot: &CausalGraph = graph;
            self.ctx
                .map_ordered(&triples, |t| self.decide(t, snapshot, sepsets))
        };

        let mut records = Vec::with_capacity(decided.len());
        let mut halted = None;
        for result in decided {
            match result {
                Ok(record) => records.push(record),
                Err(reason) => {
                    halted.get_or_insert(reason);
                }
            }
        }

        for index in self.apply_order(&records) {
            let application = self.apply(graph, &records[index]);
            let record = &mut records[index];
            record.application = application;
            self.ctx.events().emit_triple_decided(&TripleDecidedEvent {
                x: record.triple.x.clone(),
                z: record.triple.z.clone(),
                y: record.triple.y.clone(),
                decision: record.decision.as_str(),
                oriented: application == Application::Oriented,
            });
        }

        let report = ColliderReport { records, halted };
        info!(
            triples = triples.len(),
            oriented = report.oriented(),
            ambiguous = report.count(Decision::Ambiguous),
            halted = ?report.halted,
            "collider orientation finished"
        );
        self.ctx.events().emit_phase_finished(&PhaseFinishedEvent {
            phase: SearchPhase::Colliders,
            duration_ms: started.elapsed().as_millis() as u64,
        });
        report
    }

    /// Indices into `records` in application order.
    fn apply_order(&self, records: &[DecisionRecord]) -> Vec<usize> {
        let mut order: Vec<usize> = (0..records.len()).collect();
        if !(self.global && matches!(self.rule, DecisionRule::MaxP { .. })) {
            return order;
        }
        // Colliders first, strongest evidence first; everything else keeps
        // triple order behind them.
        let stratified = self.depth_stratified;
        order.sort_by(|&i, &j| {
            let (a, b) = (&records[i], &records[j]);
            let a_col = a.decision == Decision::Independent;
            let b_col = b.decision == Decision::Independent;
            match (a_col, b_col) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => i.cmp(&j),
                (true, true) => global_cmp(a, b, stratified),
            }
        });
        order
    }

    fn apply(&self, graph: &mut CausalGraph, record: &DecisionRecord) -> Application {
        let Triple { x, z, y } = &record.triple;
        match record.decision {
            Decision::Independent => {
                if graph.is_collider_triple(x, z, y) || self.is_collider_in_graph(graph, x, z, y) {
                    graph.add_collider_triple(x, z, y);
                    return Application::AlreadyCollider;
                }
                match guards::collider_guard(graph, self.knowledge, self.target, x, z, y) {
                    Ok(()) => {
                        graph.orient_collider(x, z, y, self.target);
                        graph.add_collider_triple(x, z, y);
                        debug!(triple = %record.triple, "collider oriented");
                        Application::Oriented
                    }
                    Err(reason) => {
                        debug!(triple = %record.triple, reason = %reason, "collider blocked");
                        Application::Blocked(reason)
                    }
                }
            }
            Decision::Dependent => {
                graph.add_noncollider_triple(x, z, y);
                Application::Annotated
            }
            Decision::Ambiguous => {
                graph.add_ambiguous_triple(x, z, y);
                Application::Annotated
            }
            Decision::NoSepset => Application::Skipped,
        }
    }

    fn is_collider_in_graph(&self, graph: &CausalGraph, x: &Variable, z: &Variable, y: &Variable) -> bool {
        let into_z = |a: &Variable| graph.endpoint(a, z) == Some(Endpoint::Arrow);
        match self.target {
            TargetKind::Pag => into_z(x) && into_z(y),
            TargetKind::Cpdag => graph.is_parent_of(x, z) && graph.is_parent_of(y, z),
        }
    }
}

/// p-value descending, then triple names, then the set; optionally smaller
/// sets first.
fn global_cmp(a: &DecisionRecord, b: &DecisionRecord, stratified: bool) -> Ordering {
    let size = |r: &DecisionRecord| r.sepset.as_ref().map_or(0, Vec::len);
    let p = |r: &DecisionRecord| r.p_value.unwrap_or(0.0);
    let set = |r: &DecisionRecord| r.sepset.as_deref().map(format_set).unwrap_or_default();

    let by_size = if stratified {
        size(a).cmp(&size(b))
    } else {
        Ordering::Equal
    };
    by_size
        .then_with(|| p(b).total_cmp(&p(a)))
        .then_with(|| a.triple.x.cmp(&b.triple.x))
        .then_with(|| a.triple.z.cmp(&b.triple.z))
        .then_with(|| a.triple.y.cmp(&b.triple.y))
        .then_with(|| set(a).cmp(&set(b)))
}
