//! Imperative Mutation Helpers
//!
//! Interception only sees keys that existed when a container was observed.
//! [`set`] and [`del`] add and remove keys in a way that is itself
//! reactive: new keys get an intercepted slot, and the container's
//! structural registry is notified.

use tracing::trace;

use super::object::Object;
use super::property::define_reactive;
use crate::diagnostics::{self, Diagnostic};
use crate::value::{Key, Value};

/// Set `key` on `target`, adding it reactively if it is new. Returns `value`.
///
/// - On a list, a valid index replaces (or appends) through
///   [`List::splice`](super::List::splice); the list grows with nulls if the
///   index is past the end.
/// - An existing key is assigned normally, so its slot notifies.
/// - A new key on an observed object gets an intercepted slot and the
///   object's registry is notified.
/// - A new key on root state, or on a raw object, is written as plain data
///   after a diagnostic. On an unobserved object it is written as plain data.
pub fn set(target: &Value, key: impl Into<Key>, value: impl Into<Value>) -> Value {
    let key = key.into();
    let value = value.into();

    match target {
        Value::List(list) => match key.as_index() {
            Some(index) if !list.pad_to(index) => {
                diagnostics::warn(Diagnostic::ListCapacity { index });
            }
            Some(index) => {
                list.splice(index_start(index), 1, [value.clone()]);
            }
            None => diagnostics::warn(Diagnostic::NonIndexKey { key: key.to_string() }),
        },
        Value::Object(object) => set_property(object, key, value.clone()),
        _ => diagnostics::warn(Diagnostic::PrimitiveTarget {
            action: "set",
            key: key.to_string(),
        }),
    }

    value
}

fn set_property(object: &Object, key: Key, value: Value) {
    if object.has_own(key.as_str()) {
        object.assign(key, value);
        return;
    }

    let observer = object.observer();

    if object.is_raw() {
        diagnostics::warn(Diagnostic::RawTarget {
            action: "set",
            key: key.to_string(),
        });
        write_plain(object, key, value);
        return;
    }

    if observer.as_ref().is_some_and(|observer| observer.is_root()) {
        diagnostics::warn(Diagnostic::RootStateAddition { key: key.to_string() });
        write_plain(object, key, value);
        return;
    }

    let Some(observer) = observer else {
        write_plain(object, key, value);
        return;
    };

    trace!(%key, "adding reactive property");
    if !define_reactive(object, key.clone(), Some(value), None, false) {
        diagnostics::warn(Diagnostic::NotExtensible { key: key.to_string() });
        return;
    }
    observer.dep().notify();
}

fn write_plain(object: &Object, key: Key, value: Value) {
    let name = key.to_string();
    if !object.insert_data(key, value) {
        diagnostics::warn(Diagnostic::NotExtensible { key: name });
    }
}

/// Delete `key` from `target`, notifying the container's registry.
///
/// - On a list, a valid index is removed through
///   [`List::splice`](super::List::splice).
/// - A missing key is a no-op, as is a non-configurable one.
/// - On root state or a raw object the key is removed after a diagnostic,
///   without notification.
pub fn del(target: &Value, key: impl Into<Key>) {
    let key = key.into();

    match target {
        Value::List(list) => match key.as_index() {
            Some(index) => {
                list.splice(index_start(index), 1, []);
            }
            None => diagnostics::warn(Diagnostic::NonIndexKey { key: key.to_string() }),
        },
        Value::Object(object) => delete_property(object, key),
        _ => diagnostics::warn(Diagnostic::PrimitiveTarget {
            action: "delete",
            key: key.to_string(),
        }),
    }
}

fn delete_property(object: &Object, key: Key) {
    let observer = object.observer();

    if object.is_raw() {
        diagnostics::warn(Diagnostic::RawTarget {
            action: "delete",
            key: key.to_string(),
        });
        object.remove(key.as_str());
        return;
    }

    if observer.as_ref().is_some_and(|observer| observer.is_root()) {
        diagnostics::warn(Diagnostic::RootStateDeletion { key: key.to_string() });
        object.remove(key.as_str());
        return;
    }

    if !object.has_own(key.as_str()) || !object.remove(key.as_str()) {
        return;
    }

    if let Some(observer) = observer {
        observer.dep().notify();
    }
}

fn index_start(index: usize) -> isize {
    isize::try_from(index).unwrap_or(isize::MAX)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
