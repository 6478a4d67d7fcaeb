//! Adjacency search against exact d-separation oracles.

use std::collections::BTreeSet;

use pagoda_core::events::EventDispatcher;
use pagoda_core::{Cancellable, CancellationToken, HaltReason, Knowledge, Variable};
use pagoda_search::{CachedOracle, SearchContext, SkeletonBuilder, SkeletonResult};
use test_fixtures::{random_dag, Dag, DsepOracle, FailingOracle};

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

fn adjacencies(result: &SkeletonResult) -> Vec<(String, String)> {
    result
        .graph
        .adjacent_pairs()
        .into_iter()
        .map(|(a, b)| (a.name().to_string(), b.name().to_string()))
        .collect()
}

fn pairs(list: &[(&str, &str)]) -> Vec<(String, String)> {
    list.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect()
}

#[test]
fn recovers_true_adjacencies_and_sepsets() {
    let dag = four_variable();
    let oracle = DsepOracle::new(dag.clone());
    let events = EventDispatcher::new();
    let cached = CachedOracle::new(&oracle, &events);
    let knowledge = Knowledge::default();
    let ctx = SearchContext::new();

    let result = SkeletonBuilder::new(&cached, &knowledge, &ctx).build(&dag.observed());

    assert_eq!(adjacencies(&result), pairs(&[("A", "C"), ("B", "C"), ("C", "D")]));
    assert_eq!(result.sepsets.get(&v("A"), &v("B")), Some(&[][..]));
    assert_eq!(result.sepsets.get(&v("D"), &v("A")), Some(&[v("C")][..]));
    assert_eq!(result.sepsets.get(&v("B"), &v("D")), Some(&[v("C")][..]));
    assert_eq!(result.edges_removed, 3);
    assert_eq!(result.halted, None);
    assert_eq!(result.depth_reached, Some(2));
}

#[test]
fn depth_cap_stops_early() {
    let dag = four_variable();
    let oracle = DsepOracle::new(dag.clone());
    let events = EventDispatcher::new();
    let cached = CachedOracle::new(&oracle, &events);
    let knowledge = Knowledge::default();
    let ctx = SearchContext::new();

    let result = SkeletonBuilder::new(&cached, &knowledge, &ctx)
        .with_depth(0)
        .build(&dag.observed());

    assert_eq!(
        adjacencies(&result),
        pairs(&[("A", "C"), ("A", "D"), ("B", "C"), ("B", "D"), ("C", "D")])
    );
    assert_eq!(result.depth_reached, Some(0));
    assert!(!result.sepsets.contains(&v("A"), &v("D")));
}

#[test]
fn excluded_variables_never_condition() {
    let dag = four_variable();
    let oracle = DsepOracle::new(dag.clone());
    let events = EventDispatcher::new();
    let cached = CachedOracle::new(&oracle, &events);
    let knowledge = Knowledge::default();
    let ctx = SearchContext::new();

    let result = SkeletonBuilder::new(&cached, &knowledge, &ctx)
        .with_excluded(BTreeSet::from([v("C")]))
        .build(&dag.observed());

    assert!(result.graph.is_adjacent(&v("A"), &v("D")));
    assert!(result.graph.is_adjacent(&v("B"), &v("D")));
    assert!(!result.graph.is_adjacent(&v("A"), &v("B")));
}

#[test]
fn required_edge_survives_independence() {
    let dag = four_variable();
    let oracle = DsepOracle::new(dag.clone());
    let events = EventDispatcher::new();
    let cached = CachedOracle::new(&oracle, &events);
    let mut knowledge = Knowledge::new();
    knowledge.require("A", "B");
    let ctx = SearchContext::new();

    let result = SkeletonBuilder::new(&cached, &knowledge, &ctx).build(&dag.observed());

    assert!(result.graph.is_adjacent(&v("A"), &v("B")));
    assert!(!result.sepsets.contains(&v("A"), &v("B")));
}

#[test]
fn pair_forbidden_both_ways_is_removed_up_front() {
    let dag = four_variable();
    let oracle = DsepOracle::new(dag.clone());
    let events = EventDispatcher::new();
    let cached = CachedOracle::new(&oracle, &events);
    let mut knowledge = Knowledge::new();
    knowledge.forbid("C", "D").forbid("D", "C");
    let ctx = SearchContext::new();

    let result = SkeletonBuilder::new(&cached, &knowledge, &ctx).build(&dag.observed());

    assert!(!result.graph.is_adjacent(&v("C"), &v("D")));
    assert_eq!(result.sepsets.get(&v("C"), &v("D")), Some(&[][..]));
    assert_eq!(result.sepsets.entry(&v("C"), &v("D")).and_then(|e| e.p_value), None);
}

#[test]
fn failing_oracle_keeps_edges() {
    let dag = four_variable();
    let oracle = FailingOracle::new(DsepOracle::new(dag.clone())).fail_all();
    let events = EventDispatcher::new();
    let cached = CachedOracle::new(&oracle, &events);
    let knowledge = Knowledge::default();
    let ctx = SearchContext::new();

    let result = SkeletonBuilder::new(&cached, &knowledge, &ctx).build(&dag.observed());

    assert_eq!(result.graph.edge_count(), 6);
    assert!(result.sepsets.is_empty());
    assert!(cached.stats().degraded > 0);
}

#[test]
fn cancelled_before_start_halts_with_complete_graph() {
    let dag = four_variable();
    let oracle = DsepOracle::new(dag.clone());
    let events = EventDispatcher::new();
    let cached = CachedOracle::new(&oracle, &events);
    let knowledge = Knowledge::default();
    let token = CancellationToken::new();
    token.cancel();
    let ctx = SearchContext::new().with_cancellation(token);

    let result = SkeletonBuilder::new(&cached, &knowledge, &ctx).build(&dag.observed());

    assert_eq!(result.halted, Some(HaltReason::Cancelled));
    assert_eq!(result.depth_reached, None);
    assert_eq!(result.graph.edge_count(), 6);
}

#[test]
fn stable_search_is_independent_of_worker_count() {
    let dag = random_dag(9, 0.35, 17);
    let oracle = DsepOracle::new(dag.clone());
    let knowledge = Knowledge::default();

    let run = |ctx: &SearchContext| {
        let events = EventDispatcher::new();
        let cached = CachedOracle::new(&oracle, &events);
        let result = SkeletonBuilder::new(&cached, &knowledge, ctx).build(&dag.observed());
        (adjacencies(&result), result.sepsets)
    };

    let sequential = run(&SearchContext::new());
    let parallel = run(&SearchContext::new().with_threads(4).unwrap());
    assert_eq!(sequential, parallel);
}

#[test]
fn live_search_matches_true_skeleton() {
    let dag = random_dag(8, 0.3, 5);
    let oracle = DsepOracle::new(dag.clone());
    let events = EventDispatcher::new();
    let cached = CachedOracle::new(&oracle, &events);
    let knowledge = Knowledge::default();
    let ctx = SearchContext::new();

    let result = SkeletonBuilder::new(&cached, &knowledge, &ctx)
        .with_stable(false)
        .build(&dag.observed());

    for (from, to) in &dag.edges {
        assert!(result.graph.is_adjacent(from, to), "{from} - {to} missing");
    }
    assert_eq!(result.graph.edge_count(), dag.edges.len());
}
