//! Object Containers
//!
//! An [`Object`] is an ordered map of keys to [`Property`] descriptors.
//! Until it is observed its properties are plain data; observing it replaces
//! each enumerable property with a [`ReactiveProperty`] slot.
//!
//! Plain assignment ([`Object::assign`]) behaves like assignment on an
//! ordinary object: existing slots intercept the write, but a brand-new key
//! becomes a plain data property that nothing tracks. Use
//! [`set`](crate::observer::set) to add a key reactively.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use indexmap::IndexMap;
use parking_lot::RwLock;

use super::property::ReactiveProperty;
use super::Observer;
use crate::reactive::{Dep, ReactiveContext};
use crate::value::{Key, Value};

/// A user-supplied read accessor.
pub type Getter = Arc<dyn Fn() -> Value + Send + Sync>;

/// A user-supplied write accessor.
pub type Setter = Arc<dyn Fn(Value) + Send + Sync>;

/// What a property stores.
#[derive(Clone)]
pub enum PropertyKind {
    /// A stored value.
    Data { value: Value, writable: bool },

    /// Custom accessors. A missing getter reads as `Null`; a missing setter
    /// ignores writes.
    Accessor {
        get: Option<Getter>,
        set: Option<Setter>,
    },

    /// An intercepted slot installed by the observer layer.
    Reactive(Arc<ReactiveProperty>),
}

/// A property descriptor.
#[derive(Clone)]
pub struct Property {
    pub kind: PropertyKind,
    pub enumerable: bool,
    pub configurable: bool,
}

impl Property {
    /// A writable, enumerable, configurable data property.
    pub fn data(value: impl Into<Value>) -> Self {
        Self {
            kind: PropertyKind::Data {
                value: value.into(),
                writable: true,
            },
            enumerable: true,
            configurable: true,
        }
    }

    /// An enumerable, configurable accessor property.
    pub fn accessor(get: Option<Getter>, set: Option<Setter>) -> Self {
        Self {
            kind: PropertyKind::Accessor { get, set },
            enumerable: true,
            configurable: true,
        }
    }

    pub fn non_configurable(mut self) -> Self {
        self.configurable = false;
        self
    }

    pub fn non_enumerable(mut self) -> Self {
        self.enumerable = false;
        self
    }

    /// Make a data property read-only. No effect on accessors.
    pub fn read_only(mut self) -> Self {
        if let PropertyKind::Data { writable, .. } = &mut self.kind {
            *writable = false;
        }
        self
    }

    pub fn is_reactive(&self) -> bool {
        matches!(self.kind, PropertyKind::Reactive(_))
    }

    /// Read the property value.
    pub(crate) fn read(&self) -> Value {
        match &self.kind {
            PropertyKind::Data { value, .. } => value.clone(),
            PropertyKind::Accessor { get, .. } => get.as_ref().map(|get| get()).unwrap_or_default(),
            PropertyKind::Reactive(slot) => slot.get(),
        }
    }
}

struct ObjectInner {
    props: RwLock<IndexMap<Key, Property>>,
    observer: OnceLock<Arc<Observer>>,
    extensible: AtomicBool,
    frozen: AtomicBool,
    raw: AtomicBool,
}

/// A shared handle to a keyed container.
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

impl Object {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(ObjectInner {
                props: RwLock::new(IndexMap::new()),
                observer: OnceLock::new(),
                extensible: AtomicBool::new(true),
                frozen: AtomicBool::new(false),
                raw: AtomicBool::new(false),
            }),
        }
    }

    /// Build an object of plain data properties.
    pub fn from_entries<K, I>(entries: I) -> Self
    where
        K: Into<Key>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let object = Self::new();
        {
            let mut props = object.inner.props.write();
            for (key, value) in entries {
                props.insert(key.into(), Property::data(value));
            }
        }
        object
    }

    /// Read a property. Intercepted slots link the active computation.
    pub fn get(&self, key: &str) -> Option<Value> {
        let property = self.inner.props.read().get(key).cloned()?;
        Some(property.read())
    }

    /// Plain assignment.
    ///
    /// Intercepted slots and accessor setters handle the write themselves.
    /// Read-only data and getter-only accessors ignore it. A new key becomes a
    /// plain data property, unless the object is not extensible.
    pub fn assign(&self, key: impl Into<Key>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        let kind = self.inner.props.read().get(&key).map(|p| p.kind.clone());

        match kind {
            Some(PropertyKind::Reactive(slot)) => slot.set(value),
            Some(PropertyKind::Accessor { set: Some(set), .. }) => set(value),
            Some(PropertyKind::Accessor { set: None, .. }) => {}
            Some(PropertyKind::Data { .. }) => {
                let mut props = self.inner.props.write();
                if let Some(Property {
                    kind: PropertyKind::Data { value: slot, writable: true },
                    ..
                }) = props.get_mut(&key)
                {
                    *slot = value;
                }
            }
            None => {
                self.insert_data(key, value);
            }
        }
    }

    /// Add a new plain data property. Returns `false` if the object is not
    /// extensible.
    pub(crate) fn insert_data(&self, key: Key, value: Value) -> bool {
        let mut props = self.inner.props.write();
        if let Some(existing) = props.get_mut(&key) {
            if let PropertyKind::Data { value: slot, writable: true } = &mut existing.kind {
                *slot = value;
            }
            return true;
        }
        if !self.is_extensible() {
            return false;
        }
        props.insert(key, Property::data(value));
        true
    }

    /// Define or redefine a property.
    ///
    /// Returns `false`, leaving the object untouched, when the existing
    /// property is non-configurable or the key is new and the object is not
    /// extensible.
    pub fn define_property(&self, key: impl Into<Key>, property: Property) -> bool {
        let key = key.into();
        let mut props = self.inner.props.write();
        match props.get(&key) {
            Some(existing) if !existing.configurable => return false,
            None if !self.is_extensible() => return false,
            _ => {}
        }
        props.insert(key, property);
        true
    }

    /// Plain delete. Returns `true` if the key is gone afterwards.
    pub fn remove(&self, key: &str) -> bool {
        let mut props = self.inner.props.write();
        match props.get(key) {
            Some(existing) if !existing.configurable => false,
            Some(_) => {
                props.shift_remove(key);
                true
            }
            None => true,
        }
    }

    /// A copy of the property descriptor.
    pub fn property(&self, key: &str) -> Option<Property> {
        self.inner.props.read().get(key).cloned()
    }

    pub fn has_own(&self, key: &str) -> bool {
        self.inner.props.read().contains_key(key)
    }

    /// Enumerable keys, in insertion order.
    pub fn keys(&self) -> Vec<Key> {
        self.inner
            .props
            .read()
            .iter()
            .filter(|(_, property)| property.enumerable)
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Number of own properties, enumerable or not.
    pub fn len(&self) -> usize {
        self.inner.props.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.props.read().is_empty()
    }

    /// The registry of an intercepted slot.
    pub fn property_dep(&self, key: &str) -> Option<Arc<Dep>> {
        match &self.inner.props.read().get(key)?.kind {
            PropertyKind::Reactive(slot) => Some(Arc::clone(slot.dep())),
            _ => None,
        }
    }

    /// Forbid new keys. Observation skips objects that are not extensible.
    pub fn prevent_extensions(&self) {
        self.inner.extensible.store(false, Ordering::SeqCst);
    }

    /// Make every property non-configurable and every data property
    /// read-only, and forbid new keys.
    pub fn freeze(&self) {
        let mut props = self.inner.props.write();
        for property in props.values_mut() {
            property.configurable = false;
            if let PropertyKind::Data { writable, .. } = &mut property.kind {
                *writable = false;
            }
        }
        self.inner.extensible.store(false, Ordering::SeqCst);
        self.inner.frozen.store(true, Ordering::SeqCst);
    }

    pub fn is_extensible(&self) -> bool {
        self.inner.extensible.load(Ordering::SeqCst)
    }

    pub fn is_frozen(&self) -> bool {
        self.inner.frozen.load(Ordering::SeqCst)
    }

    /// Exempt this object from observation.
    pub fn mark_raw(&self) {
        self.inner.raw.store(true, Ordering::SeqCst);
    }

    pub fn is_raw(&self) -> bool {
        self.inner.raw.load(Ordering::SeqCst)
    }

    /// The attached wrapper, if the object has been observed.
    pub fn observer(&self) -> Option<Arc<Observer>> {
        self.inner.observer.get().cloned()
    }

    /// Attach a wrapper unless one exists. The flag tells whether this call
    /// created it.
    pub(crate) fn attach_observer(&self) -> (Arc<Observer>, bool) {
        let mut created = false;
        let observer = self.inner.observer.get_or_init(|| {
            created = true;
            Arc::new(Observer::new())
        });
        (Arc::clone(observer), created)
    }

    /// Install a property, bypassing configurability checks on new keys.
    /// Returns `false` for a new key on a non-extensible object.
    pub(crate) fn install(&self, key: Key, property: Property) -> bool {
        let mut props = self.inner.props.write();
        if !props.contains_key(&key) && !self.is_extensible() {
            return false;
        }
        props.insert(key, property);
        true
    }

    /// Read without linking the active computation.
    pub fn get_untracked(&self, key: &str) -> Option<Value> {
        let _untracked = ReactiveContext::untracked();
        self.get(key)
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Default for Object {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("keys", &self.keys())
            .field("observed", &self.observer().is_some())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_adds_plain_data() {
        let object = Object::new();
        object.assign("a", 1);

        assert_eq!(object.get("a"), Some(Value::from(1)));
        assert!(!object.property("a").unwrap().is_reactive());
    }

    #[test]
    fn assign_respects_read_only_and_extensibility() {
        let object = Object::new();
        object.define_property("fixed", Property::data(1).read_only());
        object.assign("fixed", 2);
        assert_eq!(object.get("fixed"), Some(Value::from(1)));

        object.prevent_extensions();
        object.assign("new", 1);
        assert!(!object.has_own("new"));
    }

    #[test]
    fn accessor_properties_call_through() {
        let store = Arc::new(RwLock::new(Value::from(5)));
        let (read, write) = (store.clone(), store.clone());
        let object = Object::new();
        object.define_property(
            "x",
            Property::accessor(
                Some(Arc::new(move || read.read().clone())),
                Some(Arc::new(move |v| *write.write() = v)),
            ),
        );

        assert_eq!(object.get("x"), Some(Value::from(5)));
        object.assign("x", 9);
        assert_eq!(*store.read(), Value::from(9));
    }

    #[test]
    fn non_configurable_properties_resist_redefinition_and_removal() {
        let object = Object::new();
        object.define_property("id", Property::data(1).non_configurable());

        assert!(!object.define_property("id", Property::data(2)));
        assert!(!object.remove("id"));
        assert_eq!(object.get("id"), Some(Value::from(1)));
    }

    #[test]
    fn keys_skip_non_enumerable_and_keep_order() {
        let object = Object::from_entries([("b", Value::from(1)), ("a", Value::from(2))]);
        object.define_property("hidden", Property::data(3).non_enumerable());

        let keys: Vec<String> = object.keys().iter().map(|k| k.to_string()).collect();
        assert_eq!(keys, vec!["b", "a"]);
        assert_eq!(object.len(), 3);
    }

    #[test]
    fn freeze_locks_everything() {
        let object = Object::from_entries([("a", Value::from(1))]);
        object.freeze();

        object.assign("a", 2);
        assert_eq!(object.get("a"), Some(Value::from(1)));
        assert!(object.is_frozen());
        assert!(!object.is_extensible());
    }
}
