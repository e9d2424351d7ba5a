//! # Weave Engine Benchmarks
//!
//! Fast-path validation for the composition engine:
//!
//! | Component | Claim | Target |
//! |-----------|-------|--------|
//! | Registry | Resolve is a read-lock + Arc clone | < 1us |
//! | CacheLayer | Hit skips the inner chain entirely | < 1us |
//! | StrategyContext | Invoke is a read-lock + Arc clone | < 1us |
//! | NotificationBus | Notify is linear in snapshot size | < 1us/subscriber |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use weave_bus::{Event, NotificationBus, Subscriber};
use weave_chain::{CacheLayer, ChainBuilder};
use weave_registry::Registry;
use weave_strategy::{FnStrategy, StrategyContext};
use weave_types::{BoxError, FnOperation, Tag};

fn bench_registry_resolution(c: &mut Criterion) {
    let registry: Registry<u64, u64> = Registry::new();
    for i in 0..100u64 {
        registry
            .register(format!("op-{i}"), move |n| Ok(n + i))
            .unwrap();
    }
    let tag = Tag::new("op-50");

    let mut group = c.benchmark_group("registry");
    group.throughput(Throughput::Elements(1));
    group.bench_function("resolve", |b| {
        b.iter(|| registry.resolve(black_box(&tag), black_box(7)).unwrap())
    });
    group.finish();
}

fn bench_cache_layer(c: &mut Criterion) {
    let chain = ChainBuilder::<u64, u64>::new()
        .layer(Arc::new(CacheLayer::new(|input: &u64| *input)))
        .build(Arc::new(FnOperation::new(|n: u64| Ok(n * 2))));

    let mut group = c.benchmark_group("cache");
    group.throughput(Throughput::Elements(1));

    // Warm the slot once; every iteration after is a hit.
    chain.invoke(7).unwrap();
    group.bench_function("hit", |b| b.iter(|| chain.invoke(black_box(7)).unwrap()));

    // A fresh key per iteration: every call is a miss and a store.
    let mut key = 1_000u64;
    group.bench_function("miss", |b| {
        b.iter(|| {
            key += 1;
            chain.invoke(black_box(key)).unwrap()
        })
    });
    group.finish();
}

fn bench_strategy_invoke(c: &mut Criterion) {
    let context: StrategyContext<u64, u64> = StrategyContext::new();
    context
        .set_strategy(Arc::new(FnStrategy::new("double", |n: u64| Ok(n * 2))))
        .unwrap();

    let mut group = c.benchmark_group("strategy");
    group.throughput(Throughput::Elements(1));
    group.bench_function("invoke", |b| {
        b.iter(|| context.invoke(black_box(21)).unwrap())
    });
    group.finish();
}

struct NoopSubscriber {
    count: AtomicUsize,
}

impl Subscriber<u64> for NoopSubscriber {
    fn name(&self) -> &str {
        "noop"
    }

    fn on_event(&self, _event: &Event<u64>) -> Result<(), BoxError> {
        self.count.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

fn bench_bus_notify(c: &mut Criterion) {
    let mut group = c.benchmark_group("bus");

    for fanout in [1usize, 16, 64] {
        let bus: NotificationBus<u64> = NotificationBus::new();
        for _ in 0..fanout {
            bus.subscribe(
                "bench",
                Arc::new(NoopSubscriber {
                    count: AtomicUsize::new(0),
                }),
            );
        }

        group.throughput(Throughput::Elements(fanout as u64));
        group.bench_function(BenchmarkId::new("notify", fanout), |b| {
            b.iter(|| bus.notify("bench", black_box(42)))
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_registry_resolution,
    bench_cache_layer,
    bench_strategy_invoke,
    bench_bus_notify
);
criterion_main!(benches);
