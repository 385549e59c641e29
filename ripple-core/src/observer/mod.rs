//! Observable Values
//!
//! This module makes dynamic data graphs reactive.
//!
//! # Overview
//!
//! [`observe`] attaches an [`Observer`] to a container the first time it
//! becomes reachable from tracked state:
//!
//! - for an [`Object`], every enumerable own property is replaced by an
//!   intercepted slot ([`define_reactive`]), recursively observing container
//!   values;
//! - for a [`List`], every element is observed, and the list's mutators
//!   start notifying the observer's registry.
//!
//! A container carries at most one observer. Observing it again returns the
//! same one. The observer's registry tracks the container's *structure*:
//! keys added or removed through [`set`] / [`del`], and list mutations.
//!
//! # What is not observed
//!
//! Primitives, containers marked raw, objects that are not extensible, and
//! anything encountered while observation is suspended on the current thread
//! (see [`suspend_observation`]).

mod helpers;
mod list;
mod object;
mod property;
mod traverse;

use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

use crate::reactive::Dep;
use crate::value::Value;

pub use helpers::{del, set};
pub use list::{List, ListMethod};
pub use object::{Getter, Object, Property, PropertyKind, Setter};
pub use property::{define_reactive, warn_on_write, InvalidWriteHook, ReactiveProperty};
pub use traverse::traverse;

/// The wrapper attached to an observed container.
#[derive(Debug)]
pub struct Observer {
    dep: Arc<Dep>,
    /// How many external bindings use the container as their root state.
    root_count: AtomicUsize,
}

impl Observer {
    pub(crate) fn new() -> Self {
        Self {
            dep: Arc::new(Dep::new()),
            root_count: AtomicUsize::new(0),
        }
    }

    /// The registry for structural changes of the container.
    pub fn dep(&self) -> &Arc<Dep> {
        &self.dep
    }

    /// Number of root bindings of the container.
    pub fn root_count(&self) -> usize {
        self.root_count.load(Ordering::SeqCst)
    }

    pub fn is_root(&self) -> bool {
        self.root_count() > 0
    }
}

thread_local! {
    static SHOULD_OBSERVE: Cell<bool> = const { Cell::new(true) };
}

/// Whether new containers are observed on this thread.
pub fn should_observe() -> bool {
    SHOULD_OBSERVE.with(Cell::get)
}

/// Suspend observation of new containers on this thread until the guard is
/// dropped. Containers that already carry an observer are unaffected.
pub fn suspend_observation() -> ObservingGuard {
    ObservingGuard {
        previous: SHOULD_OBSERVE.with(|flag| flag.replace(false)),
    }
}

/// Restores the observation toggle to its prior value when dropped.
#[must_use = "observation resumes as soon as the guard is dropped"]
pub struct ObservingGuard {
    previous: bool,
}

impl Drop for ObservingGuard {
    fn drop(&mut self) {
        SHOULD_OBSERVE.with(|flag| flag.set(self.previous));
    }
}

/// Make `value`'s graph reactive and return its observer.
///
/// Returns `None` for values that cannot be observed. `as_root` records a
/// root binding, which makes adding or deleting keys on the container
/// through [`set`] / [`del`] emit a diagnostic.
pub fn observe(value: &Value, as_root: bool) -> Option<Arc<Observer>> {
    let observer = match value {
        Value::Object(object) => observe_object(object),
        Value::List(list) => observe_list(list),
        _ => return None,
    };

    if as_root {
        if let Some(observer) = &observer {
            observer.root_count.fetch_add(1, Ordering::SeqCst);
        }
    }

    observer
}

fn observe_object(object: &Object) -> Option<Arc<Observer>> {
    if let Some(observer) = object.observer() {
        return Some(observer);
    }
    if !should_observe() || !object.is_extensible() || object.is_raw() {
        return None;
    }

    let (observer, created) = object.attach_observer();
    if created {
        debug!(keys = object.len(), "observing object");
        walk(object);
    }
    Some(observer)
}

fn observe_list(list: &List) -> Option<Arc<Observer>> {
    if let Some(observer) = list.observer() {
        return Some(observer);
    }
    if !should_observe() || list.is_raw() {
        return None;
    }

    let (observer, created) = list.attach_observer();
    if created {
        debug!(len = list.len(), "observing list");
        observe_items(&list.to_vec());
    }
    Some(observer)
}

/// Intercept every enumerable own property.
fn walk(object: &Object) {
    for key in object.keys() {
        define_reactive(object, key, None, None, false);
    }
}

/// Observe each element.
pub(crate) fn observe_items(items: &[Value]) {
    for item in items {
        observe(item, false);
    }
}

/// Link the active computation to every observed element of `list`,
/// descending into nested lists.
pub(crate) fn depend_array(list: &List) {
    for item in list.to_vec() {
        if let Some(observer) = item.observer() {
            observer.dep().depend();
        }
        if let Value::List(inner) = &item {
            depend_array(inner);
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
