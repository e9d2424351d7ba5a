//! # Cache Layer - Time-Bounded Memoization
//!
//! Memoizes successful results of the inner chain, keyed by a pure,
//! caller-supplied function of the call input.
//!
//! ## Semantics
//!
//! - A hit (entry age < TTL) returns the stored value **without invoking
//!   the inner chain**. This is observable side-effect suppression: layers
//!   below the cache do not see suppressed calls. Layers that must see
//!   every call belong outside the cache.
//! - A miss invokes the inner chain and stores a successful result with its
//!   creation timestamp. Failures are never cached.
//! - Expiry is lazy: staleness is checked at read time. An opportunistic
//!   write-path sweep (interval-gated, like a GC) and an `lru`-bounded
//!   entry table keep memory bounded; `sweep()` is also callable directly.
//! - Entries are never mutated in place, only replaced.
//!
//! ## Concurrency Policy: First Write Wins, In-Flight De-Duplication
//!
//! At most one recomputation per key runs at a time. Concurrent callers
//! that miss the same key block on a per-key gate and re-read the winner's
//! entry once it lands. If the winner fails, one waiter claims the next
//! recomputation.
//!
//! A store is suppressed when the key was invalidated while the recompute
//! was in flight, or when an enclosing cancellation scope was cancelled
//! (a timed-out call must not populate an entry the caller never
//! received - see [`crate::cancel`]).

use crate::cancel;
use crate::chain::{Layer, Next};
use lru::LruCache;
use parking_lot::{Condvar, Mutex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use weave_types::OperationError;

/// Cache layer settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Entry lifetime. An entry is valid iff `now - creation < ttl`.
    pub ttl: Duration,

    /// Maximum live entries; the least recently used entry is evicted
    /// beyond this.
    pub max_entries: usize,

    /// Minimum interval between opportunistic write-path sweeps of expired
    /// entries. `None` disables sweeping (lazy expiry still applies).
    pub sweep_interval: Option<Duration>,
}

impl CacheConfig {
    /// Default entry lifetime.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(60);

    /// Default entry bound.
    pub const DEFAULT_MAX_ENTRIES: usize = 1024;

    /// Default sweep interval.
    pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(10);
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Self::DEFAULT_TTL,
            max_entries: Self::DEFAULT_MAX_ENTRIES,
            sweep_interval: Some(Self::DEFAULT_SWEEP_INTERVAL),
        }
    }
}

/// Cache observability counters.
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub entries: usize,
    pub capacity: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub suppressed_stores: u64,
}

/// Memoized result of one successful call.
struct CacheEntry<O> {
    value: O,
    created_at: Instant,
}

impl<O> CacheEntry<O> {
    fn is_fresh(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() < ttl
    }
}

/// Per-key recompute gate. Waiters block until the owner completes.
struct Gate {
    done: Mutex<bool>,
    completed: Condvar,
    invalidated: AtomicBool,
}

impl Gate {
    fn new() -> Self {
        Self {
            done: Mutex::new(false),
            completed: Condvar::new(),
            invalidated: AtomicBool::new(false),
        }
    }

    fn wait(&self) {
        let mut done = self.done.lock();
        while !*done {
            self.completed.wait(&mut done);
        }
    }

    fn complete(&self) {
        *self.done.lock() = true;
        self.completed.notify_all();
    }
}

/// Removes the gate and wakes waiters when the recompute ends, even if the
/// inner chain panics.
struct GateRelease<'a, K: Hash + Eq> {
    gates: &'a Mutex<HashMap<K, Arc<Gate>>>,
    key: K,
    gate: Arc<Gate>,
}

impl<K: Hash + Eq> Drop for GateRelease<'_, K> {
    fn drop(&mut self) {
        self.gates.lock().remove(&self.key);
        self.gate.complete();
    }
}

/// Decorator layer memoizing successful results, bounded by TTL and entry
/// count.
///
/// `K` is derived from the input by the caller-supplied key function,
/// which is pure and side-effect-free by contract: two calls with equal
/// derived keys are the same cache slot regardless of layers above or
/// below.
pub struct CacheLayer<I, O, K> {
    key_fn: Box<dyn Fn(&I) -> K + Send + Sync>,
    config: CacheConfig,
    entries: Mutex<LruCache<K, CacheEntry<O>>>,
    gates: Mutex<HashMap<K, Arc<Gate>>>,
    last_sweep: Mutex<Instant>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    suppressed_stores: AtomicU64,
}

impl<I, O, K> CacheLayer<I, O, K>
where
    K: Hash + Eq + Clone,
{
    /// Create a cache layer with default settings.
    #[must_use]
    pub fn new(key_fn: impl Fn(&I) -> K + Send + Sync + 'static) -> Self {
        Self::with_config(key_fn, CacheConfig::default())
    }

    /// Create a cache layer with custom settings.
    #[must_use]
    pub fn with_config(
        key_fn: impl Fn(&I) -> K + Send + Sync + 'static,
        config: CacheConfig,
    ) -> Self {
        let capacity = NonZeroUsize::new(config.max_entries.max(1)).unwrap();
        Self {
            key_fn: Box::new(key_fn),
            config,
            entries: Mutex::new(LruCache::new(capacity)),
            gates: Mutex::new(HashMap::new()),
            last_sweep: Mutex::new(Instant::now()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            suppressed_stores: AtomicU64::new(0),
        }
    }

    /// Drop the entry for `key`, if present. Returns whether one existed.
    ///
    /// An in-flight recompute for `key` is marked so its result will not be
    /// stored. Safe to call concurrently with reads and writes.
    pub fn invalidate(&self, key: &K) -> bool {
        let removed = self.entries.lock().pop(key).is_some();
        if let Some(gate) = self.gates.lock().get(key) {
            gate.invalidated.store(true, Ordering::SeqCst);
        }
        if removed {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!("Cache entry invalidated");
        }
        removed
    }

    /// Drop every entry and mark every in-flight recompute invalidated.
    pub fn invalidate_all(&self) {
        let flushed = {
            let mut entries = self.entries.lock();
            let count = entries.len();
            entries.clear();
            count
        };
        for gate in self.gates.lock().values() {
            gate.invalidated.store(true, Ordering::SeqCst);
        }
        self.evictions.fetch_add(flushed as u64, Ordering::Relaxed);
        debug!(flushed, "Cache cleared");
    }

    /// Evict every expired entry now, regardless of the sweep interval.
    /// Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.lock();
        self.evict_expired(&mut entries)
    }

    /// Current counters.
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.lock().len(),
            capacity: self.config.max_entries,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            suppressed_stores: self.suppressed_stores.load(Ordering::Relaxed),
        }
    }

    fn evict_expired(&self, entries: &mut LruCache<K, CacheEntry<O>>) -> usize {
        let expired: Vec<K> = entries
            .iter()
            .filter(|(_, entry)| !entry.is_fresh(self.config.ttl))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            entries.pop(key);
        }
        if !expired.is_empty() {
            self.evictions
                .fetch_add(expired.len() as u64, Ordering::Relaxed);
            debug!(swept = expired.len(), "Swept expired cache entries");
        }
        expired.len()
    }

    fn maybe_sweep(&self, entries: &mut LruCache<K, CacheEntry<O>>) {
        let Some(interval) = self.config.sweep_interval else {
            return;
        };
        {
            let mut last = self.last_sweep.lock();
            if last.elapsed() < interval {
                return;
            }
            *last = Instant::now();
        }
        self.evict_expired(entries);
    }
}

impl<I, O, K> Layer<I, O> for CacheLayer<I, O, K>
where
    O: Clone + Send,
    K: Hash + Eq + Clone + Send,
{
    fn name(&self) -> &str {
        "cache"
    }

    fn call(&self, input: I, next: Next<I, O>) -> Result<O, OperationError> {
        let key = (self.key_fn)(&input);

        let gate = loop {
            // Read path: a fresh entry short-circuits the inner chain.
            {
                let mut entries = self.entries.lock();
                let fresh = entries
                    .peek(&key)
                    .filter(|entry| entry.is_fresh(self.config.ttl))
                    .map(|entry| entry.value.clone());
                if let Some(value) = fresh {
                    entries.promote(&key);
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    trace!("Cache hit");
                    return Ok(value);
                }
                // An expired entry is replaced by the recompute, never reused.
                if entries.pop(&key).is_some() {
                    self.evictions.fetch_add(1, Ordering::Relaxed);
                }
            }

            // Miss: claim the recompute or wait for the in-flight one.
            let (gate, is_owner) = {
                let mut gates = self.gates.lock();
                match gates.get(&key) {
                    Some(gate) => (Arc::clone(gate), false),
                    None => {
                        let gate = Arc::new(Gate::new());
                        gates.insert(key.clone(), Arc::clone(&gate));
                        (gate, true)
                    }
                }
            };

            if is_owner {
                break gate;
            }
            trace!("Waiting on in-flight recompute");
            gate.wait();
            // Winner stored (or failed); re-read the table.
        };

        // Sole recompute for this key: first write wins.
        self.misses.fetch_add(1, Ordering::Relaxed);
        let release = GateRelease {
            gates: &self.gates,
            key: key.clone(),
            gate: Arc::clone(&gate),
        };

        let result = next.invoke(input);

        if let Ok(value) = &result {
            if cancel::current_cancelled() || gate.invalidated.load(Ordering::SeqCst) {
                self.suppressed_stores.fetch_add(1, Ordering::Relaxed);
                debug!("Cache store suppressed (call abandoned or key invalidated mid-flight)");
            } else {
                let mut entries = self.entries.lock();
                self.maybe_sweep(&mut entries);
                let stored = CacheEntry {
                    value: value.clone(),
                    created_at: Instant::now(),
                };
                if let Some((displaced, _)) = entries.push(key.clone(), stored) {
                    if displaced != key {
                        self.evictions.fetch_add(1, Ordering::Relaxed);
                    }
                }
                trace!("Cache store");
            }
        }

        drop(release);
        result
    }
}
