//! Engine throughput benchmarks.
//!
//! Run with: `cargo bench --bench process`
//!
//! Compares both engines under identical address streams:
//! - sequential cyclic (the all-hits worst case for tree rank queries)
//! - uniform random over a universe larger than the window
//! - Zipfian (skewed reuse, the common instrumentation shape)

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Zipf};

use reusekit::tracker::{Access, ApproxTracker, ExactTracker};

const CAPACITY: u64 = 4096;
const UNIVERSE: u64 = 16_384;
const OPS: usize = 100_000;
const SEED: u64 = 42;

fn sequential_stream() -> Vec<Access> {
    (0..OPS)
        .map(|i| Access::new(0, i as u64 % CAPACITY))
        .collect()
}

fn uniform_stream() -> Vec<Access> {
    let mut rng = StdRng::seed_from_u64(SEED);
    (0..OPS)
        .map(|_| Access::new(0, rng.gen_range(0..UNIVERSE)))
        .collect()
}

fn zipf_stream() -> Vec<Access> {
    let mut rng = StdRng::seed_from_u64(SEED);
    let zipf = Zipf::new(UNIVERSE, 1.03).expect("valid zipf parameters");
    (0..OPS)
        .map(|_| {
            let sample: f64 = zipf.sample(&mut rng);
            Access::new(0, sample as u64 - 1)
        })
        .collect()
}

fn workloads() -> Vec<(&'static str, Vec<Access>)> {
    vec![
        ("sequential", sequential_stream()),
        ("uniform", uniform_stream()),
        ("zipf", zipf_stream()),
    ]
}

fn bench_exact_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("exact_process");
    group.throughput(Throughput::Elements(OPS as u64));
    for (name, stream) in workloads() {
        group.bench_function(name, |b| {
            b.iter_batched(
                || ExactTracker::new(CAPACITY),
                |mut tracker| {
                    for &access in &stream {
                        tracker.process(black_box(access));
                    }
                    tracker
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_approx_process(c: &mut Criterion) {
    let mut group = c.benchmark_group("approx_process");
    group.throughput(Throughput::Elements(OPS as u64));
    for (name, stream) in workloads() {
        group.bench_function(name, |b| {
            b.iter_batched(
                || ApproxTracker::new(CAPACITY),
                |mut tracker| {
                    for &access in &stream {
                        tracker.process(black_box(access));
                    }
                    tracker
                },
                BatchSize::LargeInput,
            )
        });
    }
    group.finish();
}

fn bench_exact_distance_query(c: &mut Criterion) {
    let mut warm = ExactTracker::new(CAPACITY);
    for access in sequential_stream() {
        warm.process(access);
    }

    c.bench_function("exact_distance_query", |b| {
        let mut rng = StdRng::seed_from_u64(SEED);
        b.iter(|| {
            let access = Access::new(0, rng.gen_range(0..CAPACITY));
            black_box(warm.distance(black_box(access)))
        })
    });
}

fn bench_approx_cleanup(c: &mut Criterion) {
    c.bench_function("approx_cleanup", |b| {
        b.iter_batched(
            || {
                let mut tracker = ApproxTracker::new(CAPACITY);
                for access in uniform_stream() {
                    tracker.process(access);
                }
                tracker
            },
            |mut tracker| {
                tracker.cleanup();
                tracker
            },
            BatchSize::LargeInput,
        )
    });
}

criterion_group!(
    benches,
    bench_exact_process,
    bench_approx_process,
    bench_exact_distance_query,
    bench_approx_cleanup
);
criterion_main!(benches);
