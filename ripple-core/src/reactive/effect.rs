//! Effect Implementation
//!
//! An Effect is a side-effecting computation that re-runs whenever a
//! reactive value it read changes.
//!
//! # How Effects Work
//!
//! 1. When created, the effect runs its function immediately to establish
//!    initial dependencies.
//!
//! 2. Every read made during a run links the effect to the value's registry.
//!    After the run, registries that were not read again are dropped.
//!
//! 3. When a registry notifies, the effect re-runs synchronously.
//!
//! # Re-entrancy
//!
//! An effect may write to a value it depends on while it is running. The
//! resulting notification does not recurse into the effect; it is recorded
//! and the effect runs once more after the current run finishes. Consecutive
//! follow-up runs are bounded by [`Config::max_update_count`]; past the bound
//! the effect stops and reports [`Diagnostic::InfiniteUpdateLoop`].
//!
//! # Lifetime
//!
//! `Effect` is a handle; clones share the same computation. Registries only
//! hold weak references, so dropping every handle stops the effect and
//! removes it from every registry it read.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use super::context::ReactiveContext;
use super::dep::Dep;
use super::subscriber::{downgrade, Dependencies, Subscriber, SubscriberId};
use crate::config::Config;
use crate::diagnostics::{self, Diagnostic};

/// A side-effecting computation that runs when dependencies change.
///
/// # Example
///
/// ```rust,ignore
/// let state = Value::from(json!({ "count": 0 }));
/// observe(&state, false);
/// let obj = state.as_object().unwrap().clone();
///
/// let effect = Effect::new(move || {
///     println!("Count is: {:?}", obj.get("count"));
/// });
///
/// state.as_object().unwrap().assign("count", 5); // Prints: "Count is: Some(Number(5.0))"
/// ```
#[derive(Clone)]
pub struct Effect {
    inner: Arc<EffectInner>,
}

struct EffectInner {
    id: SubscriberId,

    /// The effect function.
    run: Box<dyn Fn() + Send + Sync>,

    /// Registries read by the latest run.
    deps: Mutex<Dependencies>,

    disposed: AtomicBool,

    /// Set while the function is executing.
    running: AtomicBool,

    /// A notification arrived while running.
    pending: AtomicBool,

    run_count: AtomicUsize,

    me: Weak<EffectInner>,
}

impl Effect {
    /// Create a new effect with the given function.
    ///
    /// The function runs immediately to establish initial dependencies.
    pub fn new<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let effect = Self::new_lazy(run);
        effect.execute();
        effect
    }

    /// Create a new effect without running it immediately.
    ///
    /// It has no dependencies, and is not notified of anything, until the
    /// first [`execute`](Effect::execute).
    pub fn new_lazy<F>(run: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        let inner = Arc::new_cyclic(|me| EffectInner {
            id: SubscriberId::new(),
            run: Box::new(run),
            deps: Mutex::new(Dependencies::new()),
            disposed: AtomicBool::new(false),
            running: AtomicBool::new(false),
            pending: AtomicBool::new(false),
            run_count: AtomicUsize::new(0),
            me: me.clone(),
        });
        debug!(subscriber = inner.id.raw(), "effect created");

        Self { inner }
    }

    /// Get the subscriber ID for this effect.
    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }

    /// Execute the effect function, tracking what it reads.
    pub fn execute(&self) {
        self.inner.execute();
    }

    /// Re-run in response to a change. Runs synchronously.
    pub fn schedule(&self) {
        self.inner.execute();
    }

    /// Dispose of the effect.
    ///
    /// Unsubscribes from every registry; the effect will not run again.
    pub fn dispose(&self) {
        if !self.inner.disposed.swap(true, Ordering::SeqCst) {
            self.inner.deps.lock().teardown(self.inner.id);
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    /// Number of completed runs.
    pub fn run_count(&self) -> usize {
        self.inner.run_count.load(Ordering::SeqCst)
    }

    /// Number of registries the latest run subscribed to.
    pub fn dependency_count(&self) -> usize {
        self.inner.deps.lock().len()
    }

    /// This effect as a type-erased subscriber.
    pub fn as_subscriber(&self) -> Arc<dyn Subscriber> {
        self.inner.clone()
    }
}

impl EffectInner {
    fn execute(&self) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }

        if self.running.swap(true, Ordering::SeqCst) {
            self.pending.store(true, Ordering::SeqCst);
            return;
        }

        let _running = RunningFlag(self);
        let limit = Config::max_update_count();
        let mut reruns = 0;

        loop {
            self.run_once();

            if self.disposed.load(Ordering::SeqCst) || !self.pending.swap(false, Ordering::SeqCst) {
                break;
            }

            reruns += 1;
            if reruns > limit {
                diagnostics::warn(Diagnostic::InfiniteUpdateLoop {
                    subscriber: self.id.raw(),
                    limit,
                });
                break;
            }
        }
    }

    fn run_once(&self) {
        let Some(me) = self.me.upgrade() else {
            return;
        };

        let _cleanup = CleanupDeps(self);
        let _ctx = ReactiveContext::enter(me);

        (self.run)();

        self.run_count.fetch_add(1, Ordering::SeqCst);
    }
}

impl Subscriber for EffectInner {
    fn id(&self) -> SubscriberId {
        self.id
    }

    fn add_dep(&self, dep: &Arc<Dep>) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        let subscribe = self.deps.lock().record(dep);
        if subscribe {
            dep.add_sub(self.id, downgrade(&self.me));
        }
    }

    fn update(&self) {
        self.execute();
    }
}

impl Drop for EffectInner {
    fn drop(&mut self) {
        self.deps.get_mut().teardown(self.id);
    }
}

/// Clears `running` when execution ends, however it ends.
struct RunningFlag<'a>(&'a EffectInner);

impl Drop for RunningFlag<'_> {
    fn drop(&mut self) {
        self.0.pending.store(false, Ordering::SeqCst);
        self.0.running.store(false, Ordering::SeqCst);
    }
}

/// Settles the dependency swap at the end of a run, even a failed one.
struct CleanupDeps<'a>(&'a EffectInner);

impl Drop for CleanupDeps<'_> {
    fn drop(&mut self) {
        let inner = self.0;
        let mut deps = inner.deps.lock();
        if inner.disposed.load(Ordering::SeqCst) {
            deps.teardown(inner.id);
        } else {
            deps.cleanup(inner.id);
        }
    }
}

impl std::fmt::Debug for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Effect")
            .field("id", &self.inner.id)
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
