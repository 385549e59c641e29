//! Deep tracked reads.

use std::collections::HashSet;

use crate::reactive::DepId;
use crate::value::Value;

/// Read every nested property of `value` through its slots, so the active
/// computation depends on the whole graph.
///
/// Frozen objects are skipped along with everything beneath them. Observed
/// containers are visited once each, which keeps cycles finite.
pub fn traverse(value: &Value) {
    let mut seen = HashSet::new();
    visit(value, &mut seen);
}

fn visit(value: &Value, seen: &mut HashSet<DepId>) {
    let Some(observer) = value.observer() else {
        return visit_children(value, seen);
    };
    if seen.insert(observer.dep().id()) {
        visit_children(value, seen);
    }
}

fn visit_children(value: &Value, seen: &mut HashSet<DepId>) {
    match value {
        Value::Object(object) if !object.is_frozen() => {
            for key in object.keys() {
                if let Some(child) = object.get(key.as_str()) {
                    visit(&child, seen);
                }
            }
        }
        Value::List(list) => {
            for item in list.to_vec() {
                visit(&item, seen);
            }
        }
        _ => {}
    }
}
