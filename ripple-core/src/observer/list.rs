//! List Containers
//!
//! A [`List`] is a shared, ordered sequence of values. Its structural
//! mutators are the interception layer for lists: each one performs the
//! ordinary operation, then, if the list has been observed, observes any
//! elements it inserted and notifies the list's structural registry.
//!
//! | method      | inserted elements          |
//! |-------------|----------------------------|
//! | push        | all arguments              |
//! | unshift     | all arguments              |
//! | splice      | the items after start/count |
//! | pop, shift  | none                       |
//! | sort, reverse | none                     |
//!
//! Indexed reads ([`List::get`]) are not tracked. A computation depends on a
//! list's contents by reading the list through a reactive slot.

use std::cmp::Ordering as CmpOrdering;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use parking_lot::RwLock;
use tracing::trace;

use super::{observe_items, Observer};
use crate::value::Value;

/// The intercepted structural operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListMethod {
    Push,
    Pop,
    Shift,
    Unshift,
    Splice,
    Sort,
    Reverse,
}

impl ListMethod {
    /// Whether the method can insert new elements.
    pub fn inserts(self) -> bool {
        matches!(self, ListMethod::Push | ListMethod::Unshift | ListMethod::Splice)
    }
}

struct ListInner {
    items: RwLock<Vec<Value>>,
    observer: OnceLock<Arc<Observer>>,
    raw: AtomicBool,
}

/// A shared handle to an ordered container.
#[derive(Clone)]
pub struct List {
    inner: Arc<ListInner>,
}

impl List {
    pub fn new() -> Self {
        Self::from_values(Vec::new())
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self {
            inner: Arc::new(ListInner {
                items: RwLock::new(values.into_iter().collect()),
                observer: OnceLock::new(),
                raw: AtomicBool::new(false),
            }),
        }
    }

    // ---- untracked reads -------------------------------------------------

    pub fn len(&self) -> usize {
        self.inner.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.read().is_empty()
    }

    /// Element at `index`. Not tracked.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.inner.items.read().get(index).cloned()
    }

    /// Snapshot of the elements.
    pub fn to_vec(&self) -> Vec<Value> {
        self.inner.items.read().clone()
    }

    // ---- intercepted mutations -------------------------------------------

    /// Append one element. Returns the new length.
    pub fn push(&self, value: impl Into<Value>) -> usize {
        self.push_all([value.into()])
    }

    /// Append elements in order. Returns the new length.
    pub fn push_all(&self, values: impl IntoIterator<Item = Value>) -> usize {
        let inserted: Vec<Value> = values.into_iter().collect();
        self.intercept(ListMethod::Push, &inserted, |items| {
            items.extend(inserted.iter().cloned());
            items.len()
        })
    }

    /// Prepend one element. Returns the new length.
    pub fn unshift(&self, value: impl Into<Value>) -> usize {
        self.unshift_all([value.into()])
    }

    /// Prepend elements as a block, keeping their order. Returns the new
    /// length.
    pub fn unshift_all(&self, values: impl IntoIterator<Item = Value>) -> usize {
        let inserted: Vec<Value> = values.into_iter().collect();
        self.intercept(ListMethod::Unshift, &inserted, |items| {
            items.splice(0..0, inserted.iter().cloned());
            items.len()
        })
    }

    /// Remove and return the last element.
    pub fn pop(&self) -> Option<Value> {
        self.intercept(ListMethod::Pop, &[], |items| items.pop())
    }

    /// Remove and return the first element.
    pub fn shift(&self) -> Option<Value> {
        self.intercept(ListMethod::Shift, &[], |items| {
            if items.is_empty() {
                None
            } else {
                Some(items.remove(0))
            }
        })
    }

    /// Remove `delete_count` elements at `start` and insert `values` there.
    /// Returns the removed elements.
    ///
    /// A negative `start` counts from the end. Both `start` and
    /// `delete_count` are clamped to the list bounds.
    pub fn splice(
        &self,
        start: isize,
        delete_count: usize,
        values: impl IntoIterator<Item = Value>,
    ) -> Vec<Value> {
        let inserted: Vec<Value> = values.into_iter().collect();
        self.intercept(ListMethod::Splice, &inserted, |items| {
            let len = items.len();
            let start = if start < 0 {
                len.saturating_sub(start.unsigned_abs())
            } else {
                (start as usize).min(len)
            };
            let end = start + delete_count.min(len - start);
            items.splice(start..end, inserted.iter().cloned()).collect()
        })
    }

    /// Sort with the default ordering: nulls last, everything else by its
    /// string form. The sort is stable.
    pub fn sort(&self) {
        self.sort_by(default_order);
    }

    /// Sort with a comparator. The sort is stable.
    ///
    /// The comparator runs without the list locked, so it may read the list.
    pub fn sort_by<F>(&self, compare: F)
    where
        F: FnMut(&Value, &Value) -> CmpOrdering,
    {
        let mut sorted = self.to_vec();
        sorted.sort_by(compare);
        self.intercept(ListMethod::Sort, &[], move |items| {
            *items = sorted;
        });
    }

    /// Reverse in place.
    pub fn reverse(&self) {
        self.intercept(ListMethod::Reverse, &[], |items| items.reverse());
    }

    /// Grow to `len` with nulls. Length changes are not intercepted.
    ///
    /// Returns `false`, leaving the list untouched, if the memory cannot be
    /// reserved.
    pub(crate) fn pad_to(&self, len: usize) -> bool {
        let mut items = self.inner.items.write();
        let missing = len.saturating_sub(items.len());
        if missing == 0 {
            return true;
        }
        if items.try_reserve_exact(missing).is_err() {
            return false;
        }
        items.resize(len, Value::Null);
        true
    }

    /// Run `native` on the elements, then observe `inserted` and notify.
    fn intercept<R>(
        &self,
        method: ListMethod,
        inserted: &[Value],
        native: impl FnOnce(&mut Vec<Value>) -> R,
    ) -> R {
        let result = {
            let mut items = self.inner.items.write();
            native(&mut items)
        };

        if let Some(observer) = self.observer() {
            trace!(?method, inserted = inserted.len(), "list mutation");
            if method.inserts() && !inserted.is_empty() {
                observe_items(inserted);
            }
            observer.dep().notify();
        }

        result
    }

    // ---- observation -----------------------------------------------------

    /// Exempt this list from observation.
    pub fn mark_raw(&self) {
        self.inner.raw.store(true, Ordering::SeqCst);
    }

    pub fn is_raw(&self) -> bool {
        self.inner.raw.load(Ordering::SeqCst)
    }

    /// The attached wrapper, if the list has been observed.
    pub fn observer(&self) -> Option<Arc<Observer>> {
        self.inner.observer.get().cloned()
    }

    pub(crate) fn attach_observer(&self) -> (Arc<Observer>, bool) {
        let mut created = false;
        let observer = self.inner.observer.get_or_init(|| {
            created = true;
            Arc::new(Observer::new())
        });
        (Arc::clone(observer), created)
    }

    pub fn ptr_eq(&self, other: &List) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

fn default_order(a: &Value, b: &Value) -> CmpOrdering {
    match (a.is_null(), b.is_null()) {
        (true, true) => CmpOrdering::Equal,
        (true, false) => CmpOrdering::Greater,
        (false, true) => CmpOrdering::Less,
        (false, false) => a.to_display_string().cmp(&b.to_display_string()),
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_values(iter)
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("List")
            .field("len", &self.len())
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
    use crate::observer::observe;
    use serde_json::json;

    fn numbers(list: &List) -> Vec<f64> {
        list.to_vec().iter().filter_map(Value::as_f64).collect()
    }

    #[test]
    fn native_semantics_are_preserved() {
        let list = List::from_values([1, 2, 3].map(Value::from));

        assert_eq!(list.push(4), 4);
        assert_eq!(list.unshift_all([Value::from(-1), Value::from(0)]), 6);
        assert_eq!(list.pop(), Some(Value::from(4)));
        assert_eq!(list.shift(), Some(Value::from(-1)));
        assert_eq!(numbers(&list), vec![0.0, 1.0, 2.0, 3.0]);

        list.reverse();
        assert_eq!(numbers(&list), vec![3.0, 2.0, 1.0, 0.0]);
    }

    #[test]
    fn splice_clamps_like_the_native_operation() {
        let list = List::from_values([1, 2, 3, 4].map(Value::from));

        let removed = list.splice(-2, 10, [Value::from(9)]);
        assert_eq!(removed, vec![Value::from(3), Value::from(4)]);
        assert_eq!(numbers(&list), vec![1.0, 2.0, 9.0]);

        let removed = list.splice(10, 1, [Value::from(7)]);
        assert!(removed.is_empty());
        assert_eq!(numbers(&list), vec![1.0, 2.0, 9.0, 7.0]);

        let removed = list.splice(-10, 1, []);
        assert_eq!(removed, vec![Value::from(1)]);
    }

    #[test]
    fn default_sort_uses_string_form_and_puts_nulls_last() {
        let list = List::from_values([Value::from(10), Value::Null, Value::from(9), Value::from(1)]);
        list.sort();

        assert_eq!(
            list.to_vec(),
            vec![Value::from(1), Value::from(10), Value::from(9), Value::Null]
        );
    }

    #[test]
    fn pad_to_grows_with_nulls_only() {
        let list = List::from_values([Value::from(1)]);

        assert!(list.pad_to(3));
        assert_eq!(list.to_vec(), vec![Value::from(1), Value::Null, Value::Null]);

        assert!(list.pad_to(1));
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn empty_shift_and_pop_return_none() {
        let list = List::new();
        assert_eq!(list.pop(), None);
        assert_eq!(list.shift(), None);
    }

    #[test]
    fn inserted_elements_are_observed_only_on_observed_lists() {
        let plain = List::new();
        let element = Value::from(json!({ "a": 1 }));
        plain.push(element.clone());
        assert!(element.observer().is_none());

        let observed = Value::from(json!([]));
        observe(&observed, false);
        let list = observed.as_list().unwrap();

        let pushed = Value::from(json!({ "a": 1 }));
        let spliced = Value::from(json!({ "b": 2 }));
        list.push(pushed.clone());
        list.splice(0, 0, [spliced.clone()]);

        assert!(pushed.observer().is_some());
        assert!(spliced.observer().is_some());
    }

    #[test]
    fn method_table_matches_insertion_rules() {
        assert!(ListMethod::Push.inserts());
        assert!(ListMethod::Unshift.inserts());
        assert!(ListMethod::Splice.inserts());
        assert!(!ListMethod::Pop.inserts());
        assert!(!ListMethod::Shift.inserts());
        assert!(!ListMethod::Sort.inserts());
        assert!(!ListMethod::Reverse.inserts());
    }
}
