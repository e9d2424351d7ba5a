//! # Concurrency Hammers
//!
//! Multi-threaded validation of the engine's linearizability claims:
//! strategy swap atomicity, cache in-flight de-duplication, snapshot
//! delivery under churn, and registry table safety.

#[cfg(test)]
use rand::Rng;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
#[cfg(test)]
use std::sync::Arc;
#[cfg(test)]
use std::time::Duration;

#[cfg(test)]
use weave_bus::{Event, NotificationBus, Subscriber};
#[cfg(test)]
use weave_chain::{CacheConfig, CacheLayer, ChainBuilder, Layer};
#[cfg(test)]
use weave_registry::Registry;
#[cfg(test)]
use weave_strategy::{FnStrategy, Strategy, StrategyContext};
#[cfg(test)]
use weave_types::{BoxError, FnOperation, Tag};

#[test]
fn test_strategy_swap_linearizable_under_load() {
    crate::init_test_logging();

    // Strategies map an input to disjoint output ranges; any mixed result
    // would betray a torn swap.
    let context: Arc<StrategyContext<u64, u64>> = Arc::new(StrategyContext::new());
    context
        .set_strategy(Arc::new(FnStrategy::new("range-a", |n: u64| {
            Ok(n + 1_000_000)
        })))
        .unwrap();

    let stop = Arc::new(AtomicBool::new(false));

    let swapper = {
        let context = Arc::clone(&context);
        let stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            let mut flip = false;
            while !stop.load(Ordering::Relaxed) {
                let strategy: Arc<dyn Strategy<u64, u64>> = if flip {
                    Arc::new(FnStrategy::new("range-a", |n: u64| Ok(n + 1_000_000)))
                } else {
                    Arc::new(FnStrategy::new("range-b", |n: u64| Ok(n + 2_000_000)))
                };
                context.set_strategy(strategy).unwrap();
                flip = !flip;
            }
        })
    };

    let invokers: Vec<_> = (0..4)
        .map(|_| {
            let context = Arc::clone(&context);
            std::thread::spawn(move || {
                for i in 0..2_000u64 {
                    let out = context.invoke(i).unwrap();
                    assert!(
                        out == i + 1_000_000 || out == i + 2_000_000,
                        "torn strategy result: {out}"
                    );
                }
            })
        })
        .collect();

    for handle in invokers {
        handle.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    swapper.join().unwrap();
}

#[test]
fn test_cache_stampede_runs_inner_once() {
    let executions = Arc::new(AtomicU32::new(0));
    let executions_in_op = Arc::clone(&executions);
    let chain = Arc::new(
        ChainBuilder::<u64, u64>::new()
            .layer(Arc::new(CacheLayer::new(|input: &u64| *input)))
            .build(Arc::new(FnOperation::new(move |n: u64| {
                executions_in_op.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(40));
                Ok(n * 2)
            }))),
    );

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let chain = Arc::clone(&chain);
            std::thread::spawn(move || chain.invoke(21).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), 42);
    }
    assert_eq!(executions.load(Ordering::SeqCst), 1);
}

#[test]
fn test_concurrent_invalidation_is_safe() {
    let cache: Arc<CacheLayer<u64, u64, u64>> = Arc::new(CacheLayer::with_config(
        |input: &u64| *input,
        CacheConfig {
            ttl: Duration::from_secs(60),
            ..CacheConfig::default()
        },
    ));
    let chain = Arc::new(
        ChainBuilder::<u64, u64>::new()
            .layer(Arc::clone(&cache) as Arc<dyn Layer<u64, u64>>)
            .build(Arc::new(FnOperation::new(|n: u64| Ok(n)))),
    );

    let stop = Arc::new(AtomicBool::new(false));
    let invalidator = {
        let cache = Arc::clone(&cache);
        let stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                cache.invalidate_all();
                std::thread::yield_now();
            }
        })
    };

    let callers: Vec<_> = (0..4)
        .map(|_| {
            let chain = Arc::clone(&chain);
            std::thread::spawn(move || {
                let mut rng = rand::thread_rng();
                for _ in 0..1_000 {
                    let key = rng.gen_range(0..32u64);
                    assert_eq!(chain.invoke(key).unwrap(), key);
                }
            })
        })
        .collect();

    for handle in callers {
        handle.join().unwrap();
    }
    stop.store(true, Ordering::Relaxed);
    invalidator.join().unwrap();
}

#[cfg(test)]
struct CountingSubscriber {
    name: String,
    count: Arc<AtomicUsize>,
}

#[cfg(test)]
impl Subscriber<u64> for CountingSubscriber {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_event(&self, _event: &Event<u64>) -> Result<(), BoxError> {
        self.count.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[test]
fn test_bus_survives_subscription_churn_during_notify() {
    let bus: Arc<NotificationBus<u64>> = Arc::new(NotificationBus::new());
    let delivered = Arc::new(AtomicUsize::new(0));

    // A stable subscriber that must see every event.
    bus.subscribe(
        "load",
        Arc::new(CountingSubscriber {
            name: "stable".to_string(),
            count: Arc::clone(&delivered),
        }),
    );

    let stop = Arc::new(AtomicBool::new(false));
    let churner = {
        let bus = Arc::clone(&bus);
        let stop = Arc::clone(&stop);
        std::thread::spawn(move || {
            let scratch = Arc::new(AtomicUsize::new(0));
            while !stop.load(Ordering::Relaxed) {
                let id = bus.subscribe(
                    "load",
                    Arc::new(CountingSubscriber {
                        name: "transient".to_string(),
                        count: Arc::clone(&scratch),
                    }),
                );
                std::thread::yield_now();
                assert!(bus.unsubscribe(&id));
            }
        })
    };

    let notifications = 2_000u64;
    for i in 0..notifications {
        let report = bus.notify("load", i);
        assert!(report.all_delivered());
    }

    stop.store(true, Ordering::Relaxed);
    churner.join().unwrap();

    // The stable subscriber was in every snapshot.
    assert_eq!(delivered.load(Ordering::SeqCst) as u64, notifications);
    assert_eq!(bus.events_published(), notifications);
}

#[test]
fn test_registry_concurrent_setup_and_resolution() {
    let registry: Arc<Registry<u64, u64>> = Arc::new(Registry::new());

    let writers: Vec<_> = (0..4)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for i in 0..50u64 {
                    let tag = format!("op-{worker}-{i}");
                    registry.register(tag, move |n| Ok(n + i)).unwrap();
                }
            })
        })
        .collect();
    for handle in writers {
        handle.join().unwrap();
    }
    assert_eq!(registry.len(), 200);

    let readers: Vec<_> = (0..4)
        .map(|worker| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for i in 0..50u64 {
                    let tag = Tag::new(format!("op-{worker}-{i}"));
                    assert_eq!(registry.resolve(&tag, 100).unwrap(), 100 + i);
                }
            })
        })
        .collect();
    for handle in readers {
        handle.join().unwrap();
    }
}
