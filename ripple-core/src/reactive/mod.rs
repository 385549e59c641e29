//! Reactive Primitives
//!
//! This module implements the subscribe/notify substrate: registries,
//! the active-computation tracker, and the computations built on them.
//!
//! # Concepts
//!
//! ## Registries
//!
//! A [`Dep`] collects the computations interested in one observable slot.
//! Reading the slot inside a computation calls [`Dep::depend`]; writing it
//! calls [`Dep::notify`].
//!
//! ## The Tracker
//!
//! [`ReactiveContext`] is a thread-local stack naming the computation that is
//! currently running. Registries consult it to know whom to link.
//!
//! ## Computations
//!
//! Anything implementing [`Subscriber`] can be tracked. [`Effect`] re-runs
//! eagerly on change; [`Memo`] recomputes lazily on the next read.
//! [`Signal`] is a typed reactive cell for statically shaped state; dynamic
//! data graphs go through [`crate::observer`] instead.

mod context;
mod dep;
mod effect;
mod memo;
mod signal;
mod subscriber;

pub use context::ReactiveContext;
pub use dep::{Dep, DepId};
pub use effect::Effect;
pub use memo::{Memo, MemoState};
pub use signal::Signal;
pub use subscriber::{Dependencies, Subscriber, SubscriberId};
