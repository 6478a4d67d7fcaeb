//! Full searches: targets, cancellation, validation, events, determinism.

use std::sync::{Arc, Mutex};

use pagoda_core::events::{
    EdgeRemovedEvent, EventDispatcher, OracleFailureEvent, PhaseStartedEvent, SearchPhase,
};
use pagoda_core::variable::variables;
use pagoda_core::{
    Cancellable, CancellationToken, ColliderPolicy, Knowledge, PagodaErrorCode, SearchConfig,
    SearchEventHandler, TargetKind, Variable,
};
use pagoda_graph::{is_legal, paths};
use pagoda_search::{search, SearchContext, SearchError, SearchStatus, SearchWarning};
use test_fixtures::{random_dag, CountingOracle, Dag, DsepOracle, FailingOracle, TableOracle};

fn v(name: &str) -> Variable {
    Variable::new(name)
}

/// A -> C <- B, C -> D.
fn four_variable() -> Dag {
    Dag::new(&["A", "B", "C", "D"])
        .edge("A", "C")
        .edge("B", "C")
        .edge("C", "D")
}

fn pag() -> SearchConfig {
    SearchConfig {
        target: TargetKind::Pag,
        ..SearchConfig::default()
    }
}

#[test]
fn cpdag_of_four_variables() {
    let dag = four_variable();
    let oracle = DsepOracle::new(dag.clone());
    let out = search(
        &dag.observed(),
        &oracle,
        &Knowledge::default(),
        &SearchConfig::default(),
        &SearchContext::new(),
    )
    .unwrap();

    assert_eq!(out.status, SearchStatus::Completed);
    assert!(out.is_complete());
    assert_eq!(out.edge_strings(), vec!["A --> C", "B --> C", "C --> D"]);
    assert!(out.warnings.is_empty());
    assert_eq!(
        out.sepset_lines(),
        vec!["A _||_ B | {}", "A _||_ D | {C}", "B _||_ D | {C}"]
    );
    assert_eq!(out.stats.colliders_oriented, 1);
    assert_eq!(out.stats.rule_orientations, 1);
    assert_eq!(out.stats.edges_removed, 3);
    assert!(out.stats.tests_run > 0);
}

/// The independences of `four_variable()` as explicit facts.
fn four_variable_facts() -> TableOracle {
    TableOracle::new()
        .independent("A", "B", &[], 0.8)
        .independent("A", "D", &["C"], 0.7)
        .independent("B", "D", &["C"], 0.6)
}

#[test]
fn table_facts_give_the_same_cpdag_under_every_policy() {
    let oracle = four_variable_facts();
    let vars = variables(["A", "B", "C", "D"]);
    for collider_policy in [ColliderPolicy::Sepsets, ColliderPolicy::Conservative, ColliderPolicy::MaxP] {
        for max_p_global in [false, true] {
            for stable in [false, true] {
                let config = SearchConfig {
                    collider_policy,
                    max_p_global,
                    stable,
                    ..SearchConfig::default()
                };
                let out = search(&vars, &oracle, &Knowledge::default(), &config, &SearchContext::new()).unwrap();
                assert_eq!(
                    out.edge_strings(),
                    vec!["A --> C", "B --> C", "C --> D"],
                    "{collider_policy:?} global={max_p_global} stable={stable}"
                );
                assert_eq!(out.sepset_lines(), vec!["A _||_ B | {}", "A _||_ D | {C}", "B _||_ D | {C}"]);
            }
        }
    }
}

#[test]
fn pag_of_four_variables() {
    let dag = four_variable();
    let oracle = DsepOracle::new(dag.clone());
    let out = search(&dag.observed(), &oracle, &Knowledge::default(), &pag(), &SearchContext::new()).unwrap();
    assert_eq!(out.edge_strings(), vec!["A o-> C", "B o-> C", "C --> D"]);
    assert!(is_legal(&out.graph, TargetKind::Pag, &Knowledge::default()));
}

#[test]
fn pag_marks_latent_confounder_bidirected() {
    let dag = Dag::new(&["A", "B", "L", "C", "D"])
        .edge("A", "B")
        .edge("L", "B")
        .edge("L", "C")
        .edge("D", "C")
        .latent("L");
    let oracle = DsepOracle::new(dag.clone());
    let out = search(&dag.observed(), &oracle, &Knowledge::default(), &pag(), &SearchContext::new()).unwrap();
    assert_eq!(out.edge_strings(), vec!["A o-> B", "B <-> C", "C <-o D"]);

    let with_pruning = SearchConfig {
        possible_dsep: true,
        ..pag()
    };
    let pruned = search(&dag.observed(), &oracle, &Knowledge::default(), &with_pruning, &SearchContext::new())
        .unwrap();
    assert_eq!(pruned.edge_strings(), out.edge_strings());
}

#[test]
fn zero_timeout_returns_partial_result() {
    let dag = four_variable();
    let oracle = DsepOracle::new(dag.clone());
    let config = SearchConfig {
        timeout_ms: Some(0),
        ..SearchConfig::default()
    };
    let err = search(&dag.observed(), &oracle, &Knowledge::default(), &config, &SearchContext::new())
        .unwrap_err();

    assert!(matches!(
        err,
        SearchError::TimedOut {
            phase: SearchPhase::Skeleton,
            ..
        }
    ));
    assert_eq!(err.error_code(), "TIMED_OUT");
    let partial = err.into_partial().unwrap();
    assert_eq!(partial.status, SearchStatus::TimedOut);
    assert_eq!(partial.graph.edge_count(), 6);
}

#[test]
fn cancelled_token_interrupts() {
    let dag = four_variable();
    let oracle = CountingOracle::new(DsepOracle::new(dag.clone()));
    let token = CancellationToken::new();
    token.cancel();
    let ctx = SearchContext::new().with_cancellation(token);

    let err = search(&dag.observed(), &oracle, &Knowledge::default(), &SearchConfig::default(), &ctx)
        .unwrap_err();
    assert!(matches!(err, SearchError::Interrupted { .. }));
    assert_eq!(err.partial().map(|p| p.status), Some(SearchStatus::Cancelled));
    assert_eq!(oracle.calls(), 0);
}

#[test]
fn invalid_inputs_fail_before_any_test() {
    let oracle = CountingOracle::new(DsepOracle::new(four_variable()));
    let ctx = SearchContext::new();
    let none = Knowledge::default();
    let config = SearchConfig::default();

    let duplicate = variables(["A", "B", "A"]);
    let err = search(&duplicate, &oracle, &none, &config, &ctx).unwrap_err();
    assert!(matches!(err, SearchError::InvalidInput { .. }));

    let empty = vec![v("A"), v(" ")];
    let err = search(&empty, &oracle, &none, &config, &ctx).unwrap_err();
    assert!(matches!(err, SearchError::InvalidInput { .. }));

    let mut both_ways = Knowledge::new();
    both_ways.require("A", "B").require("B", "A");
    let err = search(&variables(["A", "B"]), &oracle, &both_ways, &config, &ctx).unwrap_err();
    assert!(matches!(err, SearchError::Knowledge(_)));

    let bad_margin = SearchConfig {
        max_p_margin: -0.5,
        ..SearchConfig::default()
    };
    let err = search(&variables(["A", "B"]), &oracle, &none, &bad_margin, &ctx).unwrap_err();
    assert!(matches!(err, SearchError::Config(_)));

    assert_eq!(oracle.calls(), 0);
}

#[test]
fn empty_variable_list_is_an_empty_graph() {
    let oracle = DsepOracle::new(Dag::default());
    let out = search(&[], &oracle, &Knowledge::default(), &SearchConfig::default(), &SearchContext::new())
        .unwrap();
    assert_eq!(out.graph.node_count(), 0);
    assert!(out.edge_strings().is_empty());
}

#[test]
fn oracle_failures_degrade_to_dependence() {
    pagoda_core::tracing_setup::init_tracing_with_filter("pagoda_search=debug", false);
    let dag = four_variable();
    let oracle = FailingOracle::new(DsepOracle::new(dag.clone())).fail_on("A", "B");
    let out = search(
        &dag.observed(),
        &oracle,
        &Knowledge::default(),
        &SearchConfig::default(),
        &SearchContext::new(),
    )
    .unwrap();

    assert!(out.graph.is_adjacent(&v("A"), &v("B")));
    assert!(out.stats.degraded > 0);
    assert!(out
        .warnings
        .iter()
        .any(|w| matches!(w, SearchWarning::OracleDegraded { count } if *count == out.stats.degraded)));
}

#[test]
fn worker_count_does_not_change_the_result() {
    let dag = random_dag(10, 0.3, 11);
    let oracle = DsepOracle::new(dag.clone());
    let run = |threads: Option<usize>, target: TargetKind| {
        let config = SearchConfig {
            threads,
            target,
            ..SearchConfig::default()
        };
        search(&dag.observed(), &oracle, &Knowledge::default(), &config, &SearchContext::new()).unwrap()
    };

    for target in [TargetKind::Cpdag, TargetKind::Pag] {
        let sequential = run(None, target);
        let parallel = run(Some(4), target);
        assert_eq!(sequential.edge_strings(), parallel.edge_strings());
        assert_eq!(sequential.sepset_lines(), parallel.sepset_lines());
        assert_eq!(sequential.decisions, parallel.decisions);
    }
}

#[test]
fn cpdag_directed_edges_match_the_truth() {
    let dag = random_dag(9, 0.35, 3);
    let oracle = DsepOracle::new(dag.clone());
    let out = search(
        &dag.observed(),
        &oracle,
        &Knowledge::default(),
        &SearchConfig::default(),
        &SearchContext::new(),
    )
    .unwrap();

    assert!(!paths::has_directed_cycle(&out.graph));
    for edge in out.graph.edges().into_iter().filter(|e| e.is_directed()) {
        let (from, to) = if edge.points_towards(&edge.node2) {
            (&edge.node1, &edge.node2)
        } else {
            (&edge.node2, &edge.node1)
        };
        assert!(dag.edges.contains(&(from.clone(), to.clone())), "{edge} is not in the DAG");
    }
}

#[test]
fn guarantee_valid_output_keeps_legal_result() {
    let dag = random_dag(8, 0.4, 23);
    let oracle = DsepOracle::new(dag.clone());
    let config = SearchConfig {
        guarantee_valid_output: true,
        ..SearchConfig::default()
    };
    let out = search(&dag.observed(), &oracle, &Knowledge::default(), &config, &SearchContext::new()).unwrap();
    assert!(is_legal(&out.graph, TargetKind::Cpdag, &Knowledge::default()));
    assert!(!out
        .warnings
        .iter()
        .any(|w| matches!(w, SearchWarning::IllegalOutput { .. })));
}

#[test]
fn tiers_orient_every_cross_tier_edge() {
    let dag = four_variable();
    let oracle = DsepOracle::new(dag.clone());
    let mut knowledge = Knowledge::new();
    knowledge.set_tier("A", 0).set_tier("B", 0).set_tier("C", 1).set_tier("D", 2);
    let out = search(&dag.observed(), &oracle, &knowledge, &SearchConfig::default(), &SearchContext::new())
        .unwrap();
    assert_eq!(out.edge_strings(), vec!["A --> C", "B --> C", "C --> D"]);
}

#[derive(Default)]
struct Recorder {
    phases: Mutex<Vec<SearchPhase>>,
    removed: Mutex<usize>,
    failures: Mutex<usize>,
}

impl SearchEventHandler for Recorder {
    fn on_phase_started(&self, event: &PhaseStartedEvent) {
        self.phases.lock().unwrap().push(event.phase);
    }

    fn on_edge_removed(&self, _event: &EdgeRemovedEvent) {
        *self.removed.lock().unwrap() += 1;
    }

    fn on_oracle_failure(&self, _event: &OracleFailureEvent) {
        *self.failures.lock().unwrap() += 1;
    }
}

#[test]
fn events_follow_the_phases() {
    let dag = four_variable();
    let oracle = FailingOracle::new(DsepOracle::new(dag.clone())).fail_on("B", "D");
    let recorder = Arc::new(Recorder::default());
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(recorder.clone());
    let ctx = SearchContext::new().with_events(Arc::new(dispatcher));

    let out = search(&dag.observed(), &oracle, &Knowledge::default(), &SearchConfig::default(), &ctx).unwrap();

    assert_eq!(
        *recorder.phases.lock().unwrap(),
        vec![SearchPhase::Skeleton, SearchPhase::Colliders, SearchPhase::Rules]
    );
    assert_eq!(*recorder.removed.lock().unwrap(), out.stats.edges_removed);
    assert_eq!(*recorder.failures.lock().unwrap(), out.stats.degraded);
}

#[test]
fn stats_and_status_serialize_for_reporting() {
    let dag = four_variable();
    let oracle = DsepOracle::new(dag.clone());
    let out = search(
        &dag.observed(),
        &oracle,
        &Knowledge::default(),
        &SearchConfig::default(),
        &SearchContext::new(),
    )
    .unwrap();

    assert_eq!(serde_json::to_value(out.status).unwrap(), "completed");
    assert_eq!(serde_json::to_value(SearchStatus::TimedOut).unwrap(), "timed_out");
    let stats = serde_json::to_value(&out.stats).unwrap();
    assert_eq!(stats["edges_removed"], 3);
    assert_eq!(stats["colliders_oriented"], 1);
    assert_eq!(stats["degraded"], 0);
}
