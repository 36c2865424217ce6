/*!
 * Address Wait Benchmarks
 *
 * Fast paths of the compat primitives: value-already-changed waits,
 * no-waiter wakes and random fills
 */

use ai_os_compat::{fill_random, AddressWaiter, StaticResolver, SyncConfig};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::sync::atomic::{AtomicU32, AtomicU64, AtomicU8};

fn waiter(config: SyncConfig) -> AddressWaiter {
    let resolver: &'static StaticResolver = Box::leak(Box::new(StaticResolver::new()));
    AddressWaiter::with_resolver(resolver, config)
}

fn bench_changed_value_wait(c: &mut Criterion) {
    let mut group = c.benchmark_group("changed_value_wait");
    let waiter = waiter(SyncConfig::default());

    let byte = AtomicU8::new(1);
    let word = AtomicU32::new(1);
    let quad = AtomicU64::new(1);

    group.bench_function("u8", |b| b.iter(|| waiter.wait(&byte, black_box(0), 0u32)));
    group.bench_function("u32", |b| b.iter(|| waiter.wait(&word, black_box(0), 0u32)));
    group.bench_function("u64", |b| b.iter(|| waiter.wait(&quad, black_box(0), 0u32)));

    group.finish();
}

fn bench_wake_no_waiters(c: &mut Criterion) {
    let mut group = c.benchmark_group("wake_no_waiters");

    for (name, config) in [
        ("poll", SyncConfig::default()),
        ("park", SyncConfig::low_latency()),
    ] {
        let waiter = waiter(config);
        let value = AtomicU32::new(0);
        group.bench_with_input(BenchmarkId::from_parameter(name), &value, |b, value| {
            b.iter(|| waiter.wake_all(value))
        });
    }

    group.finish();
}

fn bench_fill_random(c: &mut Criterion) {
    let mut group = c.benchmark_group("fill_random");

    for size in [32usize, 4096, 65536] {
        let mut buf = vec![0u8; size];
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| fill_random(black_box(&mut buf)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_changed_value_wait,
    bench_wake_no_waiters,
    bench_fill_random
);
criterion_main!(benches);
