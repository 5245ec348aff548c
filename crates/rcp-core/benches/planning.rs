use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rcp_core::{Planner, PlannerConfig};
use rcp_kernel::topology::analyze;
use rcp_test_utils::{chain, layered, scenario};

fn bench_full_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("plan_layered");
    let planner = Planner::new(PlannerConfig::new().with_max_nodes_per_wave(16));

    for &(layers, width) in &[(10usize, 10usize), (20, 25), (40, 50)] {
        let s = scenario(layered(layers, width));
        group.bench_with_input(
            BenchmarkId::from_parameter(layers * width),
            &s,
            |b, s| b.iter(|| planner.plan(black_box(s))),
        );
    }
    group.finish();
}

fn bench_deep_chain(c: &mut Criterion) {
    let graph = scenario(chain(10_000, 1)).to_graph();
    c.bench_function("analyze_chain_10k", |b| b.iter(|| analyze(black_box(&graph))));
}

criterion_group!(benches, bench_full_pipeline, bench_deep_chain);
criterion_main!(benches);
