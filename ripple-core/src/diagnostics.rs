//! Diagnostics
//!
//! The engine never fails on its own behalf. Operations that are almost
//! certainly mistakes are reported as [`Diagnostic`]s instead: they are
//! logged through `tracing` and handed to any capture installed on the
//! current thread, and then the operation carries on.

use std::cell::RefCell;

use thiserror::Error;

use crate::config::Config;

/// A warning raised by the engine. Emitting one never alters control flow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Diagnostic {
    #[error("cannot {action} reactive property `{key}` on a primitive value")]
    PrimitiveTarget { action: &'static str, key: String },

    #[error(
        "avoid adding reactive property `{key}` to root state at runtime; \
         declare it up front instead"
    )]
    RootStateAddition { key: String },

    #[error("avoid deleting property `{key}` on root state; set it to null instead")]
    RootStateDeletion { key: String },

    #[error("target of `{action}` on `{key}` is marked raw and is not reactive")]
    RawTarget { action: &'static str, key: String },

    #[error("cannot add property `{key}`: the target is not extensible")]
    NotExtensible { key: String },

    #[error("`{key}` is not a valid list index")]
    NonIndexKey { key: String },

    #[error("cannot grow list to index {index}: out of memory")]
    ListCapacity { index: usize },

    #[error("invalid write to property `{key}`")]
    InvalidWrite { key: String },

    #[error(
        "computation {subscriber} re-triggered itself more than {limit} times; \
         this is likely an infinite update loop"
    )]
    InfiniteUpdateLoop { subscriber: u64, limit: usize },
}

thread_local! {
    static CAPTURES: RefCell<Vec<Vec<Diagnostic>>> = RefCell::new(Vec::new());
}

/// Report a diagnostic, unless the active [`Config`] is silent.
pub fn warn(diagnostic: Diagnostic) {
    if Config::is_silent() {
        return;
    }

    tracing::warn!(diagnostic = %diagnostic, "ripple");

    CAPTURES.with(|captures| {
        if let Some(frame) = captures.borrow_mut().last_mut() {
            frame.push(diagnostic);
        }
    });
}

/// Run `f` and collect every diagnostic it emits on this thread.
///
/// Captures nest; a diagnostic goes to the innermost one only.
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<Diagnostic>) {
    struct Frame;

    impl Drop for Frame {
        fn drop(&mut self) {
            CAPTURES.with(|captures| {
                captures.borrow_mut().pop();
            });
        }
    }

    CAPTURES.with(|captures| captures.borrow_mut().push(Vec::new()));
    let frame = Frame;
    let result = f();
    let collected = CAPTURES.with(|captures| {
        captures
            .borrow_mut()
            .last_mut()
            .map(std::mem::take)
            .unwrap_or_default()
    });
    drop(frame);

    (result, collected)
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
