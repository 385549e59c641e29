//! Property Interception
//!
//! [`define_reactive`] turns one key of an [`Object`] into a
//! [`ReactiveProperty`]: a cell holding the value, its own registry, and the
//! wrapper of the value when the value is itself a container.
//!
//! # Reads
//!
//! A tracked read links the active computation to the slot's registry and,
//! when the value is a container, to the container's structural registry.
//! If the value is a list, every observed element (recursively through
//! nested lists) is linked too, since indexed element access cannot be
//! intercepted. This over-links on purpose: an extra re-run is preferred to a
//! missed one.
//!
//! # Writes
//!
//! Writing the same value is a no-op (see [`same_value`]). Otherwise the new
//! value is stored, observed unless the slot is shallow, and the slot's
//! registry is notified.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use super::object::{Getter, Object, Property, PropertyKind, Setter};
use super::{depend_array, observe, Observer};
use crate::config::Config;
use crate::diagnostics::{self, Diagnostic};
use crate::reactive::{Dep, ReactiveContext};
use crate::value::{same_value, Key, Value};

/// Invoked, outside silent mode, before a changing write is applied.
pub type InvalidWriteHook = Arc<dyn Fn(&Key, &Value) + Send + Sync>;

/// A hook that reports every write as [`Diagnostic::InvalidWrite`].
///
/// Useful for slots whose writes should come from one owner only, such as
/// values handed down from a parent.
pub fn warn_on_write() -> InvalidWriteHook {
    Arc::new(|key: &Key, _: &Value| {
        diagnostics::warn(Diagnostic::InvalidWrite { key: key.to_string() });
    })
}

/// An intercepted property slot.
pub struct ReactiveProperty {
    key: Key,
    dep: Arc<Dep>,
    /// Backing storage, unused when a custom getter exists.
    value: RwLock<Value>,
    getter: Option<Getter>,
    setter: Option<Setter>,
    child: Mutex<Option<Arc<Observer>>>,
    shallow: bool,
    on_invalid_write: Option<InvalidWriteHook>,
}

impl ReactiveProperty {
    pub fn key(&self) -> &Key {
        &self.key
    }

    pub fn dep(&self) -> &Arc<Dep> {
        &self.dep
    }

    pub fn is_shallow(&self) -> bool {
        self.shallow
    }

    /// Read the slot, linking the active computation.
    pub fn get(&self) -> Value {
        let value = self.current();

        if ReactiveContext::is_tracking() {
            self.dep.depend();

            let child = self.child.lock().clone();
            if let Some(child) = child {
                child.dep().depend();
                if let Value::List(list) = &value {
                    depend_array(list);
                }
            }
        }

        value
    }

    /// Write the slot, notifying subscribers when the value changes.
    pub fn set(&self, new_value: Value) {
        let value = self.current();
        if same_value(&new_value, &value) {
            return;
        }

        if let Some(hook) = &self.on_invalid_write {
            if !Config::is_silent() {
                hook(&self.key, &new_value);
            }
        }

        if self.getter.is_some() && self.setter.is_none() {
            return;
        }

        match &self.setter {
            Some(setter) => setter(new_value.clone()),
            None => *self.value.write() = new_value.clone(),
        }

        let child = if self.shallow {
            None
        } else {
            observe(&new_value, false)
        };
        *self.child.lock() = child;

        self.dep.notify();
    }

    fn current(&self) -> Value {
        match &self.getter {
            Some(getter) => getter(),
            None => self.value.read().clone(),
        }
    }
}

/// Intercept `key` on `object`.
///
/// `value` seeds the slot; `None` takes the property's current value. An
/// existing accessor is preserved: its getter serves reads, its setter takes
/// writes, and a getter without a setter makes the slot read-only.
/// `shallow` keeps the value itself unobserved.
///
/// Returns `false` without touching anything when the existing property is
/// non-configurable, or the key is new and the object is not extensible.
pub fn define_reactive(
    object: &Object,
    key: impl Into<Key>,
    value: Option<Value>,
    on_invalid_write: Option<InvalidWriteHook>,
    shallow: bool,
) -> bool {
    let key = key.into();
    let existing = object.property(key.as_str());
    if existing.as_ref().is_some_and(|property| !property.configurable) {
        return false;
    }

    let (getter, setter) = match existing.as_ref().map(|property| &property.kind) {
        Some(PropertyKind::Accessor { get, set }) => (get.clone(), set.clone()),
        Some(PropertyKind::Reactive(slot)) => {
            let (read, write) = (Arc::clone(slot), Arc::clone(slot));
            let getter: Getter = Arc::new(move || read.get());
            let setter: Setter = Arc::new(move |value| write.set(value));
            (Some(getter), Some(setter))
        }
        _ => (None, None),
    };

    let value = match value {
        Some(value) => value,
        None if getter.is_none() || setter.is_some() => {
            let _untracked = ReactiveContext::untracked();
            existing.map(|property| property.read()).unwrap_or_default()
        }
        None => Value::Null,
    };

    let child = if shallow { None } else { observe(&value, false) };

    let slot = Arc::new(ReactiveProperty {
        key: key.clone(),
        dep: Arc::new(Dep::new()),
        value: RwLock::new(value),
        getter,
        setter,
        child: Mutex::new(child),
        shallow,
        on_invalid_write,
    });

    object.install(
        key,
        Property {
            kind: PropertyKind::Reactive(slot),
            enumerable: true,
            configurable: true,
        },
    )
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
