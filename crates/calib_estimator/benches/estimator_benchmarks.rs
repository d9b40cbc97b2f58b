//! Benchmarks for calib_estimator.

use calib_core::synthetic::{SyntheticConfig, SyntheticSynapses};
use calib_core::types::{ObservationSet, ParameterVector};
use calib_estimator::{Estimator, PoissonGlmEstimator};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn observations(rows: usize) -> ObservationSet {
    let records = SyntheticSynapses::new(
        ParameterVector::new(vec![0.0, 1.0, 1.0, -1.0]),
        SyntheticConfig {
            rows,
            ..Default::default()
        },
    )
    .generate();
    ObservationSet::from_records(
        vec!["pre".into(), "post".into(), "postAll".into()],
        &records,
    )
    .expect("synthetic records are valid")
}

fn benchmark_poisson_fit(c: &mut Criterion) {
    let mut group = c.benchmark_group("poisson_fit");
    let estimator = PoissonGlmEstimator::default();

    for size in [1_000, 10_000, 100_000] {
        let obs = observations(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &obs, |b, obs| {
            b.iter(|| estimator.fit_observations(black_box(obs)))
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_poisson_fit);
criterion_main!(benches);
