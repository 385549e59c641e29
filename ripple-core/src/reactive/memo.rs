//! Memo Implementation
//!
//! A Memo is a cached derived value that re-evaluates only when one of the
//! values it read changes.
//!
//! # How Memos Work
//!
//! 1. The memo starts dirty. The first [`get`](Memo::get) evaluates the
//!    computation under its own reactive context and caches the result.
//!
//! 2. A notification from any registry it read marks it dirty. Nothing is
//!    recomputed at that point.
//!
//! 3. The next `get` re-evaluates. Memos that are never read stay dirty.
//!
//! 4. When a memo is read inside another computation, that computation is
//!    linked to every registry the memo read. It is therefore notified
//!    directly by the underlying values. Registries dirty memos before any
//!    eager computation runs, so the reader always sees a fresh value.

use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use super::context::ReactiveContext;
use super::dep::Dep;
use super::subscriber::{downgrade, Dependencies, Subscriber, SubscriberId};

/// Dirty state for a memo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoState {
    /// The cached value is up-to-date.
    Clean,

    /// A dependency changed since the last evaluation.
    Dirty,
}

/// A cached derived value that recomputes only when dependencies change.
pub struct Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    inner: Arc<MemoInner<T>>,
}

struct MemoInner<T> {
    id: SubscriberId,
    compute: Box<dyn Fn() -> T + Send + Sync>,
    value: Mutex<Option<T>>,
    state: Mutex<MemoState>,
    deps: Mutex<Dependencies>,
    me: Weak<MemoInner<T>>,
}

impl<T> Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    /// Create a new memo with the given computation function.
    ///
    /// The computation is not run immediately. It runs on first access.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let inner = Arc::new_cyclic(|me| MemoInner {
            id: SubscriberId::new(),
            compute: Box::new(compute),
            value: Mutex::new(None),
            state: Mutex::new(MemoState::Dirty),
            deps: Mutex::new(Dependencies::new()),
            me: me.clone(),
        });
        debug!(subscriber = inner.id.raw(), "memo created");

        Self { inner }
    }

    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Get the current value, recomputing if necessary.
    ///
    /// Inside a tracked computation this also links the reader to everything
    /// the memo depends on.
    pub fn get(&self) -> T {
        let cached = match self.state() {
            MemoState::Clean => self.inner.value.lock().clone(),
            MemoState::Dirty => None,
        };
        let value = match cached {
            Some(value) => value,
            None => self.inner.evaluate(),
        };

        if ReactiveContext::is_tracking() {
            self.depend();
        }

        value
    }

    /// Link the active computation to every registry this memo read.
    pub fn depend(&self) {
        let deps: Vec<Arc<Dep>> = self.inner.deps.lock().current().to_vec();
        for dep in deps {
            dep.depend();
        }
    }

    /// Mark the memo as needing recomputation.
    pub fn mark_dirty(&self) {
        *self.inner.state.lock() = MemoState::Dirty;
    }

    /// Get the current dirty state.
    pub fn state(&self) -> MemoState {
        *self.inner.state.lock()
    }

    /// Check if the memo has a cached value.
    pub fn has_value(&self) -> bool {
        self.inner.value.lock().is_some()
    }

    /// Number of registries the latest evaluation read.
    pub fn dependency_count(&self) -> usize {
        self.inner.deps.lock().len()
    }
}

impl<T> MemoInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn evaluate(&self) -> T {
        let Some(me) = self.me.upgrade() else {
            return (self.compute)();
        };

        let value = {
            let _cleanup = CleanupDeps(self);
            let _ctx = ReactiveContext::enter(me);
            (self.compute)()
        };

        *self.value.lock() = Some(value.clone());
        *self.state.lock() = MemoState::Clean;
        value
    }
}

impl<T> Subscriber for MemoInner<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn add_dep(&self, dep: &Arc<Dep>) {
        let subscribe = self.deps.lock().record(dep);
        if subscribe {
            dep.add_sub(self.id, downgrade(&self.me));
        }
    }

    fn update(&self) {
        *self.state.lock() = MemoState::Dirty;
    }

    fn is_lazy(&self) -> bool {
        true
    }
}

impl<T> Drop for MemoInner<T> {
    fn drop(&mut self) {
        self.deps.get_mut().teardown(self.id);
    }
}

struct CleanupDeps<'a, T>(&'a MemoInner<T>);

impl<T> Drop for CleanupDeps<'_, T> {
    fn drop(&mut self) {
        self.0.deps.lock().cleanup(self.0.id);
    }
}

impl<T> Clone for Memo<T>
where
    T: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> std::fmt::Debug for Memo<T>
where
    T: Clone + Send + Sync + std::fmt::Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Memo")
            .field("id", &self.inner.id)
            .field("state", &self.state())
            .field("value", &*self.inner.value.lock())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
