use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use narwhal::{
    DistanceMatrix, Point, ShepardOptions, ShepardSolver, Solver, SpringOptions, SpringSolver,
};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

fn cloud(n: usize, seed: u64) -> Arc<DistanceMatrix> {
    let mut state = seed.max(1);
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (state >> 11) as f64 / (1u64 << 53) as f64
    };
    let points: Vec<Point> = (0..n).map(|_| Point::new(next() * 10.0, next())).collect();
    Arc::new(DistanceMatrix::from_points(&points))
}

fn bench_spring(c: &mut Criterion) {
    let mut group = c.benchmark_group("spring");
    group.measurement_time(Duration::from_secs(5));

    // 48 runs every pair; the larger sizes use neighbour and sample sets.
    for n in [48usize, 200, 1000] {
        let source = cloud(n, 7);
        group.bench_with_input(BenchmarkId::new("step", n), &source, |b, source| {
            b.iter_batched(
                || SpringSolver::new(source.clone(), &SpringOptions::default()).unwrap(),
                |mut solver| {
                    for _ in 0..10 {
                        black_box(solver.step().unwrap());
                    }
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn bench_shepard(c: &mut Criterion) {
    let mut group = c.benchmark_group("shepard");
    group.measurement_time(Duration::from_secs(5));

    for n in [48usize, 150] {
        let source = cloud(n, 11);
        let options = ShepardOptions {
            local_stage: false,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("step", n), &source, |b, source| {
            b.iter_batched(
                || ShepardSolver::new(source.clone(), &options).unwrap(),
                |mut solver| {
                    for _ in 0..5 {
                        black_box(solver.step().unwrap());
                    }
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_spring, bench_shepard);
criterion_main!(benches);
