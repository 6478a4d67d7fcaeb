//! Top-level search: skeleton, colliders, pruning, rules, legality.

use std::collections::{BTreeSet, HashSet};
use std::time::Instant;

use pagoda_core::events::{PhaseFinishedEvent, PhaseStartedEvent, SearchPhase, WarningEvent};
use pagoda_core::{
    BackgroundKnowledge, HaltReason, IndependenceOracle, SearchConfig, TargetKind, Variable,
};
use pagoda_graph::{check_legality, CausalGraph, Endpoint, Triple};
use tracing::{info, instrument, warn};

use crate::colliders::{ColliderOrienter, ColliderReport, DecisionRecord, DecisionRule};
use crate::context::SearchContext;
use crate::errors::SearchError;
use crate::guards;
use crate::oracle_cache::CachedOracle;
use crate::outcome::{SearchOutcome, SearchStats, SearchStatus, SearchWarning};
use crate::possible_dsep::PossibleDsepPruner;
use crate::repair::repair;
use crate::rules::{orient_by_knowledge, FciRules, MeekRules, RuleReport};
use crate::sepsets::SepsetMap;
use crate::skeleton::SkeletonBuilder;

/// Run a search with `config` over `variables`.
///
/// Inputs are validated before any oracle call. A cancelled or timed-out
/// search returns [`SearchError::Interrupted`] or [`SearchError::TimedOut`]
/// carrying the best-effort outcome reached so far.
pub fn search(
    variables: &[Variable],
    oracle: &dyn IndependenceOracle,
    knowledge: &dyn BackgroundKnowledge,
    config: &SearchConfig,
    ctx: &SearchContext,
) -> Result<SearchOutcome, SearchError> {
    SearchEngine::new(oracle, knowledge, config.clone()).run(variables, ctx)
}

/// A configured search bound to its oracle and background knowledge.
pub struct SearchEngine<'a> {
    oracle: &'a dyn IndependenceOracle,
    knowledge: &'a dyn BackgroundKnowledge,
    config: SearchConfig,
}

/// Everything accumulated so far, turned into the outcome at the end or on
/// interruption.
struct Progress {
    graph: CausalGraph,
    sepsets: SepsetMap,
    decisions: Vec<DecisionRecord>,
    warnings: Vec<SearchWarning>,
    stats: SearchStats,
    started: Instant,
}

impl Progress {
    fn into_outcome(mut self, status: SearchStatus, oracle: &CachedOracle<'_>) -> SearchOutcome {
        let oracle_stats = oracle.stats();
        self.stats.tests_run = oracle_stats.tests_run;
        self.stats.cache_hits = oracle_stats.cache_hits;
        self.stats.degraded = oracle_stats.degraded;
        self.stats.elapsed_ms = self.started.elapsed().as_millis() as u64;
        if oracle_stats.degraded > 0 {
            self.warnings.push(SearchWarning::OracleDegraded {
                count: oracle_stats.degraded,
            });
        }
        SearchOutcome {
            graph: self.graph,
            sepsets: self.sepsets,
            decisions: self.decisions,
            status,
            warnings: self.warnings,
            stats: self.stats,
        }
    }

    fn halt(self, phase: SearchPhase, reason: HaltReason, oracle: &CachedOracle<'_>) -> SearchError {
        warn!(phase = %phase, reason = %reason, "search stopped early");
        let partial = Box::new(self.into_outcome(reason.into(), oracle));
        match reason {
            HaltReason::Cancelled => SearchError::Interrupted { phase, partial },
            HaltReason::TimedOut => SearchError::TimedOut { phase, partial },
        }
    }
}

impl<'a> SearchEngine<'a> {
    pub fn new(
        oracle: &'a dyn IndependenceOracle,
        knowledge: &'a dyn BackgroundKnowledge,
        config: SearchConfig,
    ) -> Self {
        Self {
            oracle,
            knowledge,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    #[instrument(skip_all, fields(variables = variables.len(), target = ?self.config.target))]
    pub fn run(&self, variables: &[Variable], ctx: &SearchContext) -> Result<SearchOutcome, SearchError> {
        let started_at = Instant::now();
        self.validate(variables)?;
        let ctx = self.derive_context(ctx)?;
        let config = &self.config;
        let knowledge = self.knowledge;
        let target = config.target;
        let depth = config.effective_depth(variables.len());
        let excluded: BTreeSet<Variable> = config.excluded_from_conditioning.iter().cloned().collect();
        let cached = CachedOracle::new(self.oracle, ctx.events());

        info!(
            oracle = self.oracle.name(),
            policy = %config.collider_policy,
            depth,
            "search started"
        );

        // Skeleton
        let skeleton = SkeletonBuilder::new(&cached, knowledge, &ctx)
            .with_depth(depth)
            .with_stable(config.stable)
            .with_excluded(excluded.clone())
            .build(variables);
        let mut progress = Progress {
            graph: skeleton.graph,
            sepsets: skeleton.sepsets,
            decisions: Vec::new(),
            warnings: Vec::new(),
            stats: SearchStats {
                edges_removed: skeleton.edges_removed,
                depth_reached: skeleton.depth_reached,
                ..SearchStats::default()
            },
            started: started_at,
        };
        if let Some(reason) = skeleton.halted {
            return Err(progress.halt(SearchPhase::Skeleton, reason, &cached));
        }
        if target == TargetKind::Pag {
            progress.graph.reorient_all_with(Endpoint::Circle);
        }
        let mut skeleton_graph = progress.graph.clone();
        cached.clear();

        // Colliders
        let orienter = ColliderOrienter::new(DecisionRule::from_config(config), target, knowledge, &cached, &ctx)
            .with_depth(depth)
            .with_excluded(excluded.clone())
            .with_global_order(config.max_p_global, config.max_p_depth_stratified);
        orient_by_knowledge(&mut progress.graph, knowledge, target);
        let report = orienter.orient(&mut progress.graph, &progress.sepsets);
        if let Some(reason) = absorb_colliders(&mut progress, report) {
            return Err(progress.halt(SearchPhase::Colliders, reason, &cached));
        }

        // Possible-D-Sep
        if target == TargetKind::Pag && config.possible_dsep {
            cached.clear();
            let pruned = PossibleDsepPruner::new(&cached, knowledge, &ctx, config.possible_dsep_max_path_length)
                .with_excluded(excluded.clone())
                .prune(&mut progress.graph, &mut progress.sepsets);
            progress.stats.edges_removed += pruned.edges_removed;
            if let Some(reason) = pruned.halted {
                return Err(progress.halt(SearchPhase::PossibleDsep, reason, &cached));
            }
            if pruned.edges_removed > 0 {
                progress.graph.reorient_all_with(Endpoint::Circle);
                progress.graph.clear_triples();
                skeleton_graph = progress.graph.clone();
                cached.clear();
                orient_by_knowledge(&mut progress.graph, knowledge, target);
                let report = orienter.orient(&mut progress.graph, &progress.sepsets);
                if let Some(reason) = absorb_colliders(&mut progress, report) {
                    return Err(progress.halt(SearchPhase::Colliders, reason, &cached));
                }
            }
        }

        // Rules
        let started = Instant::now();
        ctx.events().emit_phase_started(&PhaseStartedEvent {
            phase: SearchPhase::Rules,
        });
        let rules = self.run_rules(&mut progress.graph, &progress.sepsets, &cached, &ctx);
        ctx.events().emit_phase_finished(&PhaseFinishedEvent {
            phase: SearchPhase::Rules,
            duration_ms: started.elapsed().as_millis() as u64,
        });
        progress.stats.rule_orientations = rules.changes;
        if let Some(reason) = rules.halted {
            return Err(progress.halt(SearchPhase::Rules, reason, &cached));
        }
        if !rules.converged {
            self.not_converged(&mut progress, &ctx, rules.iterations);
        }

        // Legality
        let issues = check_legality(&progress.graph, target, knowledge);
        if !issues.is_empty() {
            if config.guarantee_valid_output {
                let annotations = progress.graph.clone();
                let rebuild = |colliders: &BTreeSet<Triple>| {
                    let mut graph = self.rebuild(&skeleton_graph, &annotations, colliders);
                    self.run_rules(&mut graph, &progress.sepsets, &cached, &ctx);
                    graph
                };
                let repaired = repair(&progress.graph, target, knowledge, config.repair_bound, &ctx, rebuild);
                if repaired.repaired {
                    progress.graph = repaired.graph;
                    progress.warnings.push(SearchWarning::RepairApplied {
                        flipped: repaired.flipped,
                    });
                } else {
                    progress.warnings.push(SearchWarning::IllegalOutput { issues });
                }
            } else {
                warn!(issues = issues.len(), "output is not a legal graph");
                progress.warnings.push(SearchWarning::IllegalOutput { issues });
            }
        }

        if let Err(reason) = ctx.check() {
            return Err(progress.halt(SearchPhase::Repair, reason, &cached));
        }
        let outcome = progress.into_outcome(SearchStatus::Completed, &cached);
        info!(
            edges = outcome.graph.edge_count(),
            tests = outcome.stats.tests_run,
            warnings = outcome.warnings.len(),
            elapsed_ms = outcome.stats.elapsed_ms,
            "search finished"
        );
        Ok(outcome)
    }

    /// Fail fast on inputs no search could use.
    fn validate(&self, variables: &[Variable]) -> Result<(), SearchError> {
        self.config.validate()?;
        let mut seen = HashSet::new();
        for v in variables {
            if v.name().trim().is_empty() {
                return Err(SearchError::InvalidInput {
                    reason: "variable with empty name".to_string(),
                });
            }
            if !seen.insert(v) {
                return Err(SearchError::InvalidInput {
                    reason: format!("duplicate variable '{v}'"),
                });
            }
        }
        self.knowledge.validate()?;
        Ok(())
    }

    /// Apply the configured timeout and worker count on top of `ctx`.
    fn derive_context(&self, ctx: &SearchContext) -> Result<SearchContext, SearchError> {
        let mut derived = ctx.clone();
        if let Some(timeout) = self.config.timeout() {
            let token = derived.cancellation().child_with_timeout(timeout);
            derived = derived.with_cancellation(token);
        }
        if let Some(threads) = self.config.threads {
            if !derived.has_pool() {
                derived = derived.with_threads(threads)?;
            }
        }
        Ok(derived)
    }

    fn run_rules(
        &self,
        graph: &mut CausalGraph,
        sepsets: &SepsetMap,
        cached: &CachedOracle<'_>,
        ctx: &SearchContext,
    ) -> RuleReport {
        match self.config.target {
            TargetKind::Cpdag => MeekRules::new(self.knowledge, ctx).orient(graph),
            TargetKind::Pag => FciRules::new(self.knowledge, sepsets, ctx)
                .with_oracle(cached)
                .with_max_path_length(self.config.effective_max_path_length())
                .with_complete_rule_set(self.config.complete_rule_set)
                .orient(graph),
        }
    }

    /// A graph from `skeleton` with exactly `colliders` oriented and the
    /// remaining triple annotations of `annotations` carried over.
    fn rebuild(&self, skeleton: &CausalGraph, annotations: &CausalGraph, colliders: &BTreeSet<Triple>) -> CausalGraph {
        let target = self.config.target;
        let mut graph = skeleton.clone();
        graph.clear_triples();
        orient_by_knowledge(&mut graph, self.knowledge, target);
        for t in colliders {
            if guards::collider_guard(&graph, self.knowledge, target, &t.x, &t.z, &t.y).is_ok() {
                graph.orient_collider(&t.x, &t.z, &t.y, target);
                graph.add_collider_triple(&t.x, &t.z, &t.y);
            }
        }
        for t in annotations.noncollider_triples() {
            graph.add_noncollider_triple(&t.x, &t.z, &t.y);
        }
        let uncertain = annotations.ambiguous_triples().iter().chain(annotations.collider_triples());
        for t in uncertain.filter(|t| !colliders.contains(t)) {
            graph.add_ambiguous_triple(&t.x, &t.z, &t.y);
        }
        graph
    }

    fn not_converged(&self, progress: &mut Progress, ctx: &SearchContext, iterations: usize) {
        let warning = SearchWarning::NotConverged {
            phase: SearchPhase::Rules,
            iterations,
        };
        ctx.events().emit_warning(&WarningEvent {
            message: warning.to_string(),
        });
        progress.warnings.push(warning);
    }
}

/// Fold a collider pass into `progress`; returns the halt reason, if any.
fn absorb_colliders(progress: &mut Progress, report: ColliderReport) -> Option<HaltReason> {
    progress.stats.colliders_oriented = report.oriented();
    progress.decisions = report.records;
    report.halted
}
