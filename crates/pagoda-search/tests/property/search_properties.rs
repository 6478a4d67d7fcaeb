//! Property tests for pagoda-search: random DAGs with exact oracles, and
//! random fact tables whose separating sets need not be consistent.

use proptest::prelude::*;

use pagoda_core::{ColliderPolicy, EventDispatcher, Knowledge, SearchConfig, TargetKind, Variable};
use pagoda_graph::paths;
use pagoda_search::rules::MeekRules;
use pagoda_search::{
    search, CachedOracle, ColliderOrienter, DecisionRule, SearchContext, SearchOutcome, SkeletonBuilder,
};
use test_fixtures::{random_dag, Dag, DsepOracle, TableOracle};

fn run(dag: &Dag, variables: &[Variable], knowledge: &Knowledge, config: &SearchConfig) -> SearchOutcome {
    let oracle = DsepOracle::new(dag.clone());
    search(variables, &oracle, knowledge, config, &SearchContext::new()).unwrap()
}

/// A raw fact: two variable indices, a bitmask over the remaining variables
/// for the conditioning set, and a p-value.
type RawFact = (usize, usize, u32, f64);

fn fact_table(n: usize, raw: &[RawFact]) -> (Vec<Variable>, TableOracle) {
    let names: Vec<String> = (0..n).map(|i| format!("X{i}")).collect();
    let mut oracle = TableOracle::new();
    for &(i, j, mask, p) in raw {
        let (i, j) = (i % n, j % n);
        if i == j {
            continue;
        }
        let given: Vec<&str> = (0..n)
            .filter(|&k| k != i && k != j && mask & (1 << k) != 0)
            .map(|k| names[k].as_str())
            .collect();
        oracle = oracle.independent(&names[i], &names[j], &given, p);
    }
    (names.iter().map(Variable::new).collect(), oracle)
}

fn policies() -> [ColliderPolicy; 3] {
    [ColliderPolicy::Sepsets, ColliderPolicy::Conservative, ColliderPolicy::MaxP]
}

fn index(v: &Variable) -> usize {
    v.name()[1..].parse().unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn skeleton_matches_dag_adjacencies(n in 3usize..8, p in 0.1f64..0.6, seed in any::<u64>()) {
        let dag = random_dag(n, p, seed);
        let out = run(&dag, &dag.observed(), &Knowledge::default(), &SearchConfig::default());
        prop_assert_eq!(out.graph.edge_count(), dag.edges.len());
        for (from, to) in &dag.edges {
            prop_assert!(out.graph.is_adjacent(from, to));
        }
    }

    #[test]
    fn deeper_search_only_removes_edges(n in 3usize..8, p in 0.1f64..0.6, seed in any::<u64>(), depth in 0i32..3) {
        let dag = random_dag(n, p, seed);
        let shallow = SearchConfig { depth, ..SearchConfig::default() };
        let deep = SearchConfig { depth: depth + 1, ..SearchConfig::default() };
        let a = run(&dag, &dag.observed(), &Knowledge::default(), &shallow);
        let b = run(&dag, &dag.observed(), &Knowledge::default(), &deep);
        for (x, y) in b.graph.adjacent_pairs() {
            prop_assert!(a.graph.is_adjacent(&x, &y), "{} - {} appeared at depth {}", x, y, depth + 1);
        }
    }

    #[test]
    fn recorded_sepsets_separate(n in 3usize..8, p in 0.1f64..0.6, seed in any::<u64>()) {
        let dag = random_dag(n, p, seed);
        let out = run(&dag, &dag.observed(), &Knowledge::default(), &SearchConfig::default());
        for (x, y) in out.sepsets.pairs() {
            let set = out.sepsets.get(x, y).unwrap();
            prop_assert!(dag.d_separated(x, y, set), "{} and {} not separated by {:?}", x, y, set);
            prop_assert!(!out.graph.is_adjacent(x, y));
        }
    }

    #[test]
    fn cpdag_is_acyclic_and_faithful(n in 3usize..8, p in 0.1f64..0.6, seed in any::<u64>()) {
        let dag = random_dag(n, p, seed);
        let out = run(&dag, &dag.observed(), &Knowledge::default(), &SearchConfig::default());
        prop_assert!(!paths::has_directed_cycle(&out.graph));
        prop_assert!(out.warnings.is_empty());
        for edge in out.graph.edges().into_iter().filter(|e| e.is_directed()) {
            let (from, to) = if edge.points_towards(&edge.node2) {
                (edge.node1.clone(), edge.node2.clone())
            } else {
                (edge.node2.clone(), edge.node1.clone())
            };
            prop_assert!(dag.edges.contains(&(from, to)));
        }
    }

    #[test]
    fn variable_order_does_not_matter(n in 3usize..8, p in 0.1f64..0.6, seed in any::<u64>()) {
        let dag = random_dag(n, p, seed);
        let forward = dag.observed();
        let mut reversed = forward.clone();
        reversed.reverse();
        let a = run(&dag, &forward, &Knowledge::default(), &SearchConfig::default());
        let b = run(&dag, &reversed, &Knowledge::default(), &SearchConfig::default());
        prop_assert_eq!(a.edge_strings(), b.edge_strings());
    }

    #[test]
    fn policies_agree_under_exact_oracle(n in 3usize..7, p in 0.1f64..0.6, seed in any::<u64>()) {
        let dag = random_dag(n, p, seed);
        let expected = run(&dag, &dag.observed(), &Knowledge::default(), &SearchConfig::default());
        for policy in [ColliderPolicy::Conservative, ColliderPolicy::MaxP] {
            let config = SearchConfig { collider_policy: policy, ..SearchConfig::default() };
            let out = run(&dag, &dag.observed(), &Knowledge::default(), &config);
            prop_assert_eq!(out.edge_strings(), expected.edge_strings());
        }
    }

    #[test]
    fn meek_rules_are_idempotent(n in 3usize..8, p in 0.1f64..0.6, seed in any::<u64>()) {
        let dag = random_dag(n, p, seed);
        let knowledge = Knowledge::default();
        let out = run(&dag, &dag.observed(), &knowledge, &SearchConfig::default());
        let mut graph = out.graph.clone();
        let ctx = SearchContext::new();
        let report = MeekRules::new(&knowledge, &ctx).orient(&mut graph);
        prop_assert_eq!(report.changes, 0);
        prop_assert_eq!(graph.edge_strings(), out.edge_strings());
    }

    #[test]
    fn tiers_are_respected(n in 3usize..8, p in 0.1f64..0.6, seed in any::<u64>()) {
        let dag = random_dag(n, p, seed);
        let mut knowledge = Knowledge::new();
        for v in dag.observed() {
            knowledge.set_tier(v.clone(), index(&v));
        }
        let out = run(&dag, &dag.observed(), &knowledge, &SearchConfig::default());
        for edge in out.graph.edges() {
            prop_assert!(edge.is_directed(), "{} left unoriented", edge);
            let (a, b) = (index(&edge.node1), index(&edge.node2));
            let forward = if a < b { &edge.node2 } else { &edge.node1 };
            prop_assert!(edge.points_towards(forward), "{} points backwards", edge);
        }
    }

    #[test]
    fn pag_output_is_legal(n in 3usize..7, p in 0.1f64..0.6, seed in any::<u64>()) {
        let dag = random_dag(n, p, seed);
        let config = SearchConfig { target: TargetKind::Pag, ..SearchConfig::default() };
        let out = run(&dag, &dag.observed(), &Knowledge::default(), &config);
        let has_illegal_output = out.warnings.iter().any(|w| matches!(w, pagoda_search::SearchWarning::IllegalOutput { .. }));
        prop_assert!(!has_illegal_output);
        prop_assert_eq!(out.graph.edge_count(), dag.edges.len());
    }

    #[test]
    fn inconsistent_facts_never_yield_a_directed_cycle(
        n in 4usize..8,
        raw in prop::collection::vec((0usize..8, 0usize..8, any::<u32>(), 0.05f64..1.0), 0..24),
    ) {
        let (variables, oracle) = fact_table(n, &raw);
        let knowledge = Knowledge::default();
        for collider_policy in policies() {
            let config = SearchConfig { collider_policy, ..SearchConfig::default() };
            let events = EventDispatcher::new();
            let cached = CachedOracle::new(&oracle, &events);
            let ctx = SearchContext::new();

            let skeleton = SkeletonBuilder::new(&cached, &knowledge, &ctx).build(&variables);
            let mut graph = skeleton.graph;
            ColliderOrienter::new(
                DecisionRule::from_config(&config),
                TargetKind::Cpdag,
                &knowledge,
                &cached,
                &ctx,
            )
            .orient(&mut graph, &skeleton.sepsets);
            prop_assert!(
                !paths::has_directed_cycle(&graph),
                "{:?} colliders: {:?}", collider_policy, graph.edge_strings()
            );

            MeekRules::new(&knowledge, &ctx).orient(&mut graph);
            prop_assert!(
                !paths::has_directed_cycle(&graph),
                "{:?} meek: {:?}", collider_policy, graph.edge_strings()
            );

            let out = search(&variables, &oracle, &knowledge, &config, &ctx).unwrap();
            prop_assert!(!paths::has_directed_cycle(&out.graph));
        }
    }
}
