//! Integration Tests for the Observer Layer
//!
//! These tests drive observed data graphs through computations and check
//! who gets notified, and how often.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use ripple_core::{
    del, observe, set, Config, ConfigGuard, Diagnostic, Effect, Memo, Object, ReactiveContext,
    Value,
};
use serde_json::json;

fn loud() -> ConfigGuard {
    Config::scoped(Config {
        silent: false,
        ..Config::default()
    })
}

fn child(value: &Value, key: &str) -> Value {
    value.as_object().unwrap().get_untracked(key).unwrap()
}

/// An effect running `read` on `value`, with a run counter.
fn watch<F>(value: &Value, read: F) -> (Effect, Arc<AtomicUsize>)
where
    F: Fn(&Value) + Send + Sync + 'static,
{
    let runs = Arc::new(AtomicUsize::new(0));
    let (value, runs_clone) = (value.clone(), runs.clone());
    let effect = Effect::new(move || {
        read(&value);
        runs_clone.fetch_add(1, Ordering::SeqCst);
    });
    (effect, runs)
}

fn read_key(key: &'static str) -> impl Fn(&Value) + Send + Sync + 'static {
    move |value| {
        value.as_object().unwrap().get(key);
    }
}

/// A computation re-runs once per write, however often it read the key.
#[test]
fn rerun_once_per_write_not_per_read() {
    let state = Value::from(json!({ "a": 1 }));
    observe(&state, false);

    let (_effect, runs) = watch(&state, |value| {
        let object = value.as_object().unwrap();
        object.get("a");
        object.get("a");
        object.get("a");
    });

    let object = state.as_object().unwrap();
    object.assign("a", 2);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
    object.assign("a", 3);
    assert_eq!(runs.load(Ordering::SeqCst), 3);
}

/// Observing twice neither creates a second wrapper nor intercepts twice.
#[test]
fn observe_twice_shares_the_wrapper() {
    let state = Value::from(json!({ "a": 1 }));
    let first = observe(&state, false).unwrap();
    let second = observe(&state, false).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let (_effect, runs) = watch(&state, read_key("a"));
    let slot = state.as_object().unwrap().property_dep("a").unwrap();
    assert_eq!(slot.subscriber_count(), 1);

    state.as_object().unwrap().assign("a", 2);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

/// Writing NaN over NaN notifies nobody.
#[test]
fn nan_over_nan_is_silent() {
    let object = Object::from_entries([("x", Value::from(f64::NAN))]);
    let state = Value::from(object.clone());
    observe(&state, false);

    let (_effect, runs) = watch(&state, read_key("x"));
    object.assign("x", f64::NAN);
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    object.assign("x", 0.0);
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

/// Writing the same container back notifies nobody.
#[test]
fn same_reference_write_is_silent() {
    let state = Value::from(json!({ "inner": { "n": 1 } }));
    observe(&state, false);
    let inner = child(&state, "inner");

    let (_effect, runs) = watch(&state, read_key("inner"));
    state.as_object().unwrap().assign("inner", inner.clone());
    assert_eq!(runs.load(Ordering::SeqCst), 1);

    // Equal content, different container.
    state.as_object().unwrap().assign("inner", json!({ "n": 1 }));
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

/// Appending notifies the list's readers; the appended element then
/// notifies its own readers and not the list's.
#[test]
fn appended_element_is_independently_observable() {
    let state = Value::from(json!({ "items": [] }));
    observe(&state, false);
    let items = child(&state, "items");

    let (_list_reader, list_runs) = watch(&state, read_key("items"));
    let (_bystander, bystander_runs) = watch(&state, |_| {});

    let element = Value::from(json!({ "n": 1 }));
    items.as_list().unwrap().push(element.clone());
    assert_eq!(list_runs.load(Ordering::SeqCst), 2);
    assert_eq!(bystander_runs.load(Ordering::SeqCst), 1);
    assert!(element.observer().is_some());

    let (_element_reader, element_runs) = watch(&element, read_key("n"));
    element.as_object().unwrap().assign("n", 2);
    assert_eq!(element_runs.load(Ordering::SeqCst), 2);
    assert_eq!(list_runs.load(Ordering::SeqCst), 2);
}

/// Every list mutator notifies the list's readers exactly once.
#[test]
fn each_list_mutator_notifies_once() {
    let state = Value::from(json!({ "items": [3, 1, 2] }));
    observe(&state, false);
    let items = child(&state, "items");
    let list = items.as_list().unwrap();

    let (_effect, runs) = watch(&state, read_key("items"));

    list.push(4);
    list.pop();
    list.unshift(0);
    list.shift();
    list.splice(1, 1, [Value::from(9)]);
    list.sort();
    list.reverse();

    assert_eq!(runs.load(Ordering::SeqCst), 8);
    assert_eq!(
        list.to_vec(),
        vec![Value::from(9), Value::from(3), Value::from(2)]
    );
}

/// Reading a list through a slot links every element's structural registry.
#[test]
fn list_reads_over_link_to_elements() {
    let state = Value::from(json!({ "rows": [{ "id": 1 }, [{ "id": 2 }]] }));
    observe(&state, false);
    let rows = child(&state, "rows");
    let nested = rows.as_list().unwrap().get(1).unwrap();
    let deep = nested.as_list().unwrap().get(0).unwrap();

    let (_effect, runs) = watch(&state, read_key("rows"));

    // A new key on an element deep in the list re-runs the list reader.
    set(&deep, "label", "x");
    assert_eq!(runs.load(Ordering::SeqCst), 2);
}

/// A key added through `set` is tracked like a declared one.
#[test]
fn set_makes_new_key_reactive() {
    let state = Value::from(json!({ "obj": { "existing": 1 } }));
    observe(&state, false);
    let obj = child(&state, "obj");

    set(&obj, "newKey", 1);

    let (_new_reader, new_runs) = watch(&obj, read_key("newKey"));
    obj.as_object().unwrap().assign("newKey", 2);
    assert_eq!(new_runs.load(Ordering::SeqCst), 2);

    let (_existing_reader, existing_runs) = watch(&obj, read_key("existing"));
    obj.as_object().unwrap().assign("existing", 2);
    assert_eq!(existing_runs.load(Ordering::SeqCst), 2);
    assert_eq!(new_runs.load(Ordering::SeqCst), 2);
}

/// Reading a container through a slot also tracks keys added to it later.
#[test]
fn set_and_del_notify_container_readers() {
    let state = Value::from(json!({ "obj": {} }));
    observe(&state, false);
    let obj = child(&state, "obj");

    let (_effect, runs) = watch(&state, read_key("obj"));

    set(&obj, "a", 1);
    assert_eq!(runs.load(Ordering::SeqCst), 2);

    del(&obj, "a");
    assert_eq!(runs.load(Ordering::SeqCst), 3);
    assert!(!obj.as_object().unwrap().has_own("a"));
}

/// Adding to root state warns, and still stores the value.
#[test]
fn root_state_addition_warns_but_writes() {
    let _config = loud();
    let state = Value::from(json!({ "a": 1 }));
    observe(&state, true);

    let (returned, diagnostics) = ripple_core::diagnostics::capture(|| set(&state, "b", 2));

    assert_eq!(returned, Value::from(2));
    assert_eq!(diagnostics, vec![Diagnostic::RootStateAddition { key: "b".into() }]);
    assert_eq!(state.as_object().unwrap().get_untracked("b"), Some(Value::from(2)));
}

/// A sealed root reports both the addition and the failed write.
#[test]
fn root_state_addition_on_sealed_target_reports_both() {
    let _config = loud();
    let state = Value::from(json!({ "a": 1 }));
    observe(&state, true);
    state.as_object().unwrap().prevent_extensions();

    let (_, diagnostics) = ripple_core::diagnostics::capture(|| set(&state, "b", 2));

    assert_eq!(
        diagnostics,
        vec![
            Diagnostic::RootStateAddition { key: "b".into() },
            Diagnostic::NotExtensible { key: "b".into() },
        ]
    );
}

/// Silent mode emits nothing but keeps the behavior.
#[test]
fn silent_config_suppresses_diagnostics() {
    let _config = Config::scoped(Config {
        silent: true,
        ..Config::default()
    });
    let state = Value::from(json!({}));
    observe(&state, true);

    let (_, diagnostics) = ripple_core::diagnostics::capture(|| set(&state, "b", 2));
    assert!(diagnostics.is_empty());
    assert!(state.as_object().unwrap().has_own("b"));
}

/// B runs to completion inside A; reads in A afterwards belong to A.
#[test]
fn nested_rerun_restores_attribution() {
    let state = Value::from(json!({ "x": 1, "y": 0, "z": 0, "w": 0 }));
    observe(&state, false);

    let b_state = state.clone();
    let b = Effect::new(move || {
        let object = b_state.as_object().unwrap();
        let y = object.get("y").unwrap();
        object.assign("z", y);
    });

    let a_state = state.clone();
    let a = Effect::new(move || {
        let object = a_state.as_object().unwrap();
        let x = object.get("x").and_then(|x| x.as_f64()).unwrap_or_default();
        object.assign("y", x + 1.0);
        object.get("w");
    });

    assert_eq!(b.run_count(), 2);
    assert_eq!(a.dependency_count(), 2);
    assert_eq!(ReactiveContext::depth(), 0);

    let w = state.as_object().unwrap().property_dep("w").unwrap();
    assert!(w.has_subscriber(a.id()));
    assert!(!w.has_subscriber(b.id()));

    state.as_object().unwrap().assign("w", 1);
    assert_eq!(a.run_count(), 2);
    assert_eq!(b.run_count(), 2);
}

/// A computation that keeps re-triggering itself is cut off.
#[test]
fn self_triggering_computation_is_bounded() {
    let _config = Config::scoped(Config {
        silent: false,
        max_update_count: 5,
    });
    let state = Value::from(json!({ "count": 0 }));
    observe(&state, false);
    let reader = state.clone();

    let (effect, diagnostics) = ripple_core::diagnostics::capture(|| {
        Effect::new(move || {
            let object = reader.as_object().unwrap();
            let count = object.get("count").and_then(|c| c.as_f64()).unwrap_or_default();
            object.assign("count", count + 1.0);
        })
    });

    assert_eq!(effect.run_count(), 6);
    assert!(matches!(
        diagnostics.as_slice(),
        [Diagnostic::InfiniteUpdateLoop { limit: 5, .. }]
    ));
    assert_eq!(ReactiveContext::depth(), 0);
}

/// Memos over observed data recompute on the next read only.
#[test]
fn memo_over_observed_data_recomputes_lazily() {
    let state = Value::from(json!({ "price": 2, "qty": 3 }));
    observe(&state, false);
    let computes = Arc::new(AtomicUsize::new(0));

    let (reader, computes_clone) = (state.clone(), computes.clone());
    let total = Memo::new(move || {
        computes_clone.fetch_add(1, Ordering::SeqCst);
        let object = reader.as_object().unwrap();
        let price = object.get("price").and_then(|v| v.as_f64()).unwrap_or_default();
        let qty = object.get("qty").and_then(|v| v.as_f64()).unwrap_or_default();
        price * qty
    });

    assert_eq!(total.get(), 6.0);
    state.as_object().unwrap().assign("qty", 5);
    state.as_object().unwrap().assign("price", 3);
    assert_eq!(computes.load(Ordering::SeqCst), 1);

    assert_eq!(total.get(), 15.0);
    assert_eq!(computes.load(Ordering::SeqCst), 2);
}

/// A memo created after its reader is still fresh when the reader re-runs.
#[test]
fn memo_created_after_reader_is_fresh() {
    let state = Value::from(json!({ "n": 1 }));
    observe(&state, false);
    let seen = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let memo_slot: Arc<parking_lot::Mutex<Option<Memo<f64>>>> = Arc::default();
    let (slot, seen_clone) = (memo_slot.clone(), seen.clone());
    let effect = Effect::new_lazy(move || {
        let memo = slot.lock().clone();
        if let Some(memo) = memo {
            seen_clone.lock().push(memo.get());
        }
    });

    let reader = state.clone();
    *memo_slot.lock() = Some(Memo::new(move || {
        let n = reader.as_object().unwrap().get("n");
        n.and_then(|n| n.as_f64()).unwrap_or_default() * 10.0
    }));

    effect.execute();
    state.as_object().unwrap().assign("n", 2);

    assert_eq!(*seen.lock(), vec![10.0, 20.0]);
    assert_eq!(effect.run_count(), 2);
}

/// A list index past the length bound is rejected instead of allocating.
#[test]
fn oversized_list_index_is_rejected() {
    let _config = loud();
    let state = Value::from(json!({ "items": [1] }));
    observe(&state, false);
    let items = child(&state, "items");

    let (_, diagnostics) = ripple_core::diagnostics::capture(|| set(&items, "1e18", 2));

    assert!(matches!(diagnostics.as_slice(), [Diagnostic::NonIndexKey { .. }]));
    assert_eq!(items.as_list().unwrap().len(), 1);
}

/// Serializing a graph inside a computation links nothing.
#[test]
fn snapshot_serializes_without_tracking() {
    let state = Value::from(json!({ "a": [1, { "b": "c" }], "d": null }));
    observe(&state, false);

    let (effect, _runs) = watch(&state, |value| {
        let _ = serde_json::to_string(value);
    });
    assert_eq!(effect.dependency_count(), 0);

    assert_eq!(state.to_json(), json!({ "a": [1, { "b": "c" }], "d": null }));
}
