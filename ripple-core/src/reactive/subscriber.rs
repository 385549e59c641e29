//! Subscriber types for the reactive system.
//!
//! A Subscriber represents any computation that depends on reactive values.
//! This includes effects, memos, and whatever an embedding scheduler builds on
//! top of them.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use smallvec::SmallVec;

use super::dep::{Dep, DepId};

/// Unique identifier for a subscriber.
///
/// IDs increase monotonically, so ordering by ID orders subscribers by
/// creation. Registries notify in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

/// The contract every computation implements.
///
/// The engine calls [`add_dep`](Subscriber::add_dep) while the computation is
/// the active one and reads a reactive value, and [`update`](Subscriber::update)
/// when one of those values changes.
pub trait Subscriber: Send + Sync {
    /// Stable identity of this computation.
    fn id(&self) -> SubscriberId;

    /// Record that the running computation read a value guarded by `dep`.
    fn add_dep(&self, dep: &Arc<Dep>);

    /// Re-run hook, invoked by [`Dep::notify`].
    fn update(&self);

    /// Whether [`update`](Subscriber::update) only invalidates a cached
    /// value. Lazy subscribers are updated before any eager one runs, so
    /// eager computations never read a stale cache.
    fn is_lazy(&self) -> bool {
        false
    }
}

/// Per-computation record of which registries it reads.
///
/// Registries read during the current run are collected separately from the
/// ones of the previous run; [`cleanup`](Dependencies::cleanup) then
/// unsubscribes from every registry that was not read again. This keeps a
/// computation subscribed to exactly what its latest run touched.
#[derive(Default)]
pub struct Dependencies {
    deps: SmallVec<[Arc<Dep>; 8]>,
    dep_ids: HashSet<DepId>,
    new_deps: SmallVec<[Arc<Dep>; 8]>,
    new_dep_ids: HashSet<DepId>,
}

impl Dependencies {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `dep` for the current run.
    ///
    /// Returns `true` when the caller still has to subscribe to `dep`, i.e. it
    /// is new in this run and was not already subscribed by the previous one.
    pub fn record(&mut self, dep: &Arc<Dep>) -> bool {
        let id = dep.id();
        if !self.new_dep_ids.insert(id) {
            return false;
        }
        self.new_deps.push(Arc::clone(dep));
        !self.dep_ids.contains(&id)
    }

    /// Finish a run: drop subscriptions the run no longer needs and promote
    /// the newly recorded registries.
    pub fn cleanup(&mut self, subscriber: SubscriberId) {
        for dep in &self.deps {
            if !self.new_dep_ids.contains(&dep.id()) {
                dep.remove_sub(subscriber);
            }
        }
        std::mem::swap(&mut self.deps, &mut self.new_deps);
        std::mem::swap(&mut self.dep_ids, &mut self.new_dep_ids);
        self.new_deps.clear();
        self.new_dep_ids.clear();
    }

    /// Unsubscribe from everything.
    pub fn teardown(&mut self, subscriber: SubscriberId) {
        for dep in self.deps.iter().chain(self.new_deps.iter()) {
            dep.remove_sub(subscriber);
        }
        self.deps.clear();
        self.dep_ids.clear();
        self.new_deps.clear();
        self.new_dep_ids.clear();
    }

    /// Registries the latest completed run read.
    pub fn current(&self) -> &[Arc<Dep>] {
        &self.deps
    }

    pub fn len(&self) -> usize {
        self.deps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deps.is_empty()
    }
}

/// Erase a concrete subscriber into the handle registries store.
pub(crate) fn downgrade<S: Subscriber + 'static>(subscriber: &Weak<S>) -> Weak<dyn Subscriber> {
    let weak: Weak<dyn Subscriber> = subscriber.clone();
    weak
}
