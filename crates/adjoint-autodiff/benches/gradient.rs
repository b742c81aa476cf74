//! Benchmarks for single and batched gradient computation.

use adjoint_autodiff::prelude::*;
use adjoint_core::numerical::try_central_difference;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn decaying_wave(x: &Tracked<f64>) -> Result<Tracked<f64>> {
    let decay = x.mul_scalar(-2.0)?.exp()?;
    let wave = x.mul_scalar(3.0)?.sin()?.mul_scalar(3.0)?;
    decay.add(&wave)
}

fn bench_single_gradient(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_gradient");
    let fd_config = FiniteDifferenceConfig::default();

    group.bench_function("autodiff", |b| {
        b.iter(|| black_box(gradient(decaying_wave, black_box(0.3)).unwrap()));
    });

    group.bench_function("finite_difference", |b| {
        b.iter(|| {
            let d = try_central_difference(|x| evaluate(decaying_wave, x), black_box(0.3), &fd_config);
            black_box(d.unwrap())
        });
    });

    group.bench_function("closed_form", |b| {
        b.iter(|| {
            let x: f64 = black_box(0.3);
            black_box(-2.0 * (-2.0 * x).exp() + 9.0 * (3.0 * x).cos())
        });
    });

    group.finish();
}

fn bench_batch_gradient(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch_gradient");

    for &len in &[10, 100, 1_000, 10_000] {
        let xs: Vec<f64> = (0..len).map(|i| i as f64 / len as f64 * 4.0 - 2.0).collect();

        let sequential = Engine::new(
            EngineConfig::builder()
                .min_parallel_batch(usize::MAX)
                .build()
                .unwrap(),
        )
        .unwrap();
        group.bench_with_input(BenchmarkId::new("sequential", len), &xs, |b, xs| {
            b.iter(|| black_box(sequential.batch_gradient(decaying_wave, xs)));
        });

        let parallel = Engine::new(
            EngineConfig::builder()
                .min_parallel_batch(2)
                .build()
                .unwrap(),
        )
        .unwrap();
        group.bench_with_input(BenchmarkId::new("parallel", len), &xs, |b, xs| {
            b.iter(|| black_box(parallel.batch_gradient(decaying_wave, xs)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_gradient, bench_batch_gradient);
criterion_main!(benches);
