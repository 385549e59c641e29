//! Reactive Context
//!
//! The reactive context tracks which computation is currently running.
//! This enables automatic dependency tracking: when a reactive value is read,
//! the current computation is linked to that value's registry.
//!
//! # Implementation
//!
//! We use a thread-local stack. Entering a context pushes a frame, and the
//! returned guard pops it when dropped, so the previous occupant is restored
//! on every exit path, including a panic unwinding out of the computation.
//!
//! A frame may be empty ([`ReactiveContext::untracked`]): reads made inside it
//! are not attributed to anything, even when a computation is running further
//! down the stack.

use std::cell::RefCell;
use std::sync::Arc;

use super::subscriber::{Subscriber, SubscriberId};

thread_local! {
    static CONTEXT_STACK: RefCell<Vec<Option<Arc<dyn Subscriber>>>> = RefCell::new(Vec::new());
}

/// Guard that pops the context when dropped.
#[must_use = "the context is exited as soon as the guard is dropped"]
pub struct ReactiveContext {
    subscriber_id: Option<SubscriberId>,
    depth: usize,
}

impl ReactiveContext {
    /// Make `subscriber` the active computation until the guard is dropped.
    pub fn enter(subscriber: Arc<dyn Subscriber>) -> Self {
        let subscriber_id = Some(subscriber.id());
        Self::push(Some(subscriber), subscriber_id)
    }

    /// Suspend tracking until the guard is dropped.
    pub fn untracked() -> Self {
        Self::push(None, None)
    }

    fn push(frame: Option<Arc<dyn Subscriber>>, subscriber_id: Option<SubscriberId>) -> Self {
        let depth = CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            stack.push(frame);
            stack.len()
        });

        Self {
            subscriber_id,
            depth,
        }
    }

    /// Check whether reads are currently attributed to a computation.
    pub fn is_tracking() -> bool {
        CONTEXT_STACK.with(|stack| matches!(stack.borrow().last(), Some(Some(_))))
    }

    /// The active computation, if any.
    pub fn current() -> Option<Arc<dyn Subscriber>> {
        CONTEXT_STACK.with(|stack| stack.borrow().last().cloned().flatten())
    }

    /// The active computation's ID, if any.
    pub fn current_subscriber() -> Option<SubscriberId> {
        CONTEXT_STACK.with(|stack| {
            stack
                .borrow()
                .last()
                .and_then(|frame| frame.as_ref().map(|sub| sub.id()))
        })
    }

    /// Number of frames on this thread's stack.
    pub fn depth() -> usize {
        CONTEXT_STACK.with(|stack| stack.borrow().len())
    }
}

impl Drop for ReactiveContext {
    fn drop(&mut self) {
        CONTEXT_STACK.with(|stack| {
            let mut stack = stack.borrow_mut();
            debug_assert_eq!(
                stack.len(),
                self.depth,
                "ReactiveContext dropped out of order"
            );
            let popped = stack.pop();

            if let Some(frame) = popped {
                debug_assert_eq!(
                    frame.as_ref().map(|sub| sub.id()),
                    self.subscriber_id,
                    "ReactiveContext mismatch"
                );
            }
        });
    }
}
