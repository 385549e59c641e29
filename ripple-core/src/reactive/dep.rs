//! Subscription Registry
//!
//! A [`Dep`] is the set of computations interested in one observable slot:
//! a single property, or the structure of one container.
//!
//! Registries never own their subscribers. They hold `Weak` handles, while
//! each computation owns the list of registries it reads (see
//! [`Dependencies`](super::Dependencies)). A dropped computation therefore
//! simply stops being notified.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::trace;

use super::context::ReactiveContext;
use super::subscriber::{Subscriber, SubscriberId};

/// Unique identifier for a registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepId(u64);

impl DepId {
    fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// A subscription registry.
pub struct Dep {
    id: DepId,
    subs: Mutex<IndexMap<SubscriberId, Weak<dyn Subscriber>>>,
}

impl Dep {
    pub fn new() -> Self {
        Self {
            id: DepId::next(),
            subs: Mutex::new(IndexMap::new()),
        }
    }

    pub fn id(&self) -> DepId {
        self.id
    }

    /// Register `subscriber`. Registering twice keeps a single entry.
    pub fn add_sub(&self, id: SubscriberId, subscriber: Weak<dyn Subscriber>) {
        trace!(dep = self.id.0, subscriber = id.raw(), "subscribe");
        self.subs.lock().insert(id, subscriber);
    }

    pub fn remove_sub(&self, id: SubscriberId) {
        self.subs.lock().shift_remove(&id);
    }

    /// Link the active computation, if there is one, to this registry.
    ///
    /// The computation decides through [`Subscriber::add_dep`] whether it
    /// still needs to call back into [`add_sub`](Dep::add_sub).
    pub fn depend(self: &Arc<Self>) {
        if let Some(active) = ReactiveContext::current() {
            active.add_dep(self);
        }
    }

    /// Invoke the re-run hook of every current subscriber.
    ///
    /// The subscriber list is snapshotted before anything runs: subscribers
    /// registered before the call run exactly once, and a subscriber that
    /// re-registers during its own re-run is not invoked again in this pass.
    ///
    /// Lazy subscribers are invalidated first, then eager ones run in
    /// creation order.
    pub fn notify(&self) {
        let mut subs: Vec<(SubscriberId, Weak<dyn Subscriber>)> = {
            let mut guard = self.subs.lock();
            guard.retain(|_, sub| sub.strong_count() > 0);
            guard
                .iter()
                .map(|(id, sub)| (*id, Weak::clone(sub)))
                .collect()
        };

        if subs.is_empty() {
            return;
        }

        subs.sort_by_key(|(id, _)| *id);
        trace!(dep = self.id.0, count = subs.len(), "notify");

        let mut eager = Vec::with_capacity(subs.len());
        for (_, sub) in subs {
            match sub.upgrade() {
                Some(lazy) if lazy.is_lazy() => lazy.update(),
                Some(_) => eager.push(sub),
                None => {}
            }
        }

        for sub in eager {
            if let Some(sub) = sub.upgrade() {
                sub.update();
            }
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subs
            .lock()
            .values()
            .filter(|sub| sub.strong_count() > 0)
            .count()
    }

    pub fn has_subscriber(&self, id: SubscriberId) -> bool {
        self.subs.lock().contains_key(&id)
    }
}

impl Default for Dep {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dep")
            .field("id", &self.id.0)
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
