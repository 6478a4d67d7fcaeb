//! Search benchmarks.
//!
//! Targets:
//! - CPDAG search over 12 variables < 20ms
//! - PAG search over 12 variables < 100ms

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use pagoda_core::{ColliderPolicy, Knowledge, SearchConfig, TargetKind};
use pagoda_search::{search, SearchContext};
use test_fixtures::{random_dag, DsepOracle};

fn bench_search(c: &mut Criterion) {
    pagoda_core::tracing_setup::init_tracing();
    let dag = random_dag(12, 0.25, 42);
    let variables = dag.observed();
    let oracle = DsepOracle::new(dag.clone());
    let knowledge = Knowledge::default();

    c.bench_function("cpdag_sepsets_12", |b| {
        let config = SearchConfig::default();
        let ctx = SearchContext::new();
        b.iter(|| {
            let out = search(black_box(&variables), &oracle, &knowledge, &config, &ctx).unwrap();
            black_box(out);
        });
    });

    c.bench_function("cpdag_max_p_12", |b| {
        let config = SearchConfig {
            collider_policy: ColliderPolicy::MaxP,
            ..SearchConfig::default()
        };
        let ctx = SearchContext::new();
        b.iter(|| {
            let out = search(black_box(&variables), &oracle, &knowledge, &config, &ctx).unwrap();
            black_box(out);
        });
    });

    c.bench_function("pag_12", |b| {
        let config = SearchConfig {
            target: TargetKind::Pag,
            ..SearchConfig::default()
        };
        let ctx = SearchContext::new();
        b.iter(|| {
            let out = search(black_box(&variables), &oracle, &knowledge, &config, &ctx).unwrap();
            black_box(out);
        });
    });

    c.bench_function("cpdag_4_threads_12", |b| {
        let config = SearchConfig::default();
        let ctx = SearchContext::new().with_threads(4).unwrap();
        b.iter(|| {
            let out = search(black_box(&variables), &oracle, &knowledge, &config, &ctx).unwrap();
            black_box(out);
        });
    });
}

criterion_group!(benches, bench_search);
criterion_main!(benches);
