//! Signal Implementation
//!
//! A Signal is a typed reactive cell: one value plus the registry that
//! tracks who read it. It is the statically-typed counterpart of a
//! reactive object property, meant for state whose shape is known at
//! compile time.
//!
//! # How Signals Work
//!
//! 1. Reading a signal inside a computation links the computation to the
//!    signal's registry.
//!
//! 2. Writing a value that differs from the current one notifies every
//!    linked computation before `set` returns. Writing an equal value does
//!    nothing. A value that is not equal to itself (a NaN) is treated as equal
//!    to another such value.

use std::fmt::Debug;
use std::sync::Arc;

use parking_lot::RwLock;

use super::dep::Dep;

/// A reactive cell holding a value of type T.
///
/// ```rust,ignore
/// let count = Signal::new(0);
/// let value = count.get();
/// count.set(5); // notifies subscribers
/// ```
pub struct Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    value: Arc<RwLock<T>>,
    dep: Arc<Dep>,
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    /// Create a new signal with the given initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: Arc::new(RwLock::new(value)),
            dep: Arc::new(Dep::new()),
        }
    }

    /// Get the current value, linking the active computation.
    pub fn get(&self) -> T {
        self.dep.depend();
        self.value.read().clone()
    }

    /// Get the current value without tracking dependencies.
    pub fn get_untracked(&self) -> T {
        self.value.read().clone()
    }

    /// Set a new value and notify subscribers if it changed.
    pub fn set(&self, value: T) {
        {
            let mut guard = self.value.write();
            if unchanged(&*guard, &value) {
                return;
            }
            *guard = value;
        }

        self.dep.notify();
    }

    /// Update the value using a function of the current one.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let new_value = {
            let guard = self.value.read();
            f(&guard)
        };
        self.set(new_value);
    }

    /// The registry tracking readers of this signal.
    pub fn dep(&self) -> &Arc<Dep> {
        &self.dep
    }

    /// Get the number of subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.dep.subscriber_count()
    }
}

#[allow(clippy::eq_op)]
fn unchanged<T: PartialEq>(old: &T, new: &T) -> bool {
    old == new || (old != old && new != new)
}

impl<T> Clone for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            value: Arc::clone(&self.value),
            dep: Arc::clone(&self.dep),
        }
    }
}

impl<T> Debug for Signal<T>
where
    T: Clone + PartialEq + Send + Sync + Debug + 'static,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("value", &self.get_untracked())
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
