//! Ripple Core
//!
//! This crate provides fine-grained dependency tracking for dynamic,
//! nested data graphs. It implements:
//!
//! - Subscription registries and the active-computation tracker
//! - Eager (effect) and lazy (memo) computations
//! - Transparent interception of object properties and list mutators
//! - Reactive key addition and deletion
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `reactive`: registries, the tracker, and the computations built on them
//! - `observer`: observation of object and list graphs
//! - `value`: the dynamic value model
//! - `config` / `diagnostics`: engine knobs and warnings
//!
//! # Example
//!
//! ```rust,ignore
//! use ripple_core::{observe, set, Effect, Value};
//! use serde_json::json;
//!
//! let state = Value::from(json!({ "user": { "name": "ada" } }));
//! observe(&state, true);
//!
//! let root = state.clone();
//! let _effect = Effect::new(move || {
//!     // Reading `user` through its slot also tracks the user's keys.
//!     let user = root.as_object().unwrap().get("user").unwrap();
//!     let user = user.as_object().unwrap();
//!     println!("{:?} {:?}", user.get("name"), user.get("email"));
//! });
//!
//! let user = state.as_object().unwrap().get_untracked("user").unwrap();
//! user.as_object().unwrap().assign("name", "grace"); // re-runs
//! set(&user, "email", "grace@example.com");          // re-runs, `email` is now tracked
//! ```

pub mod config;
pub mod diagnostics;
pub mod observer;
pub mod reactive;
pub mod value;

pub use config::{Config, ConfigGuard};
pub use diagnostics::Diagnostic;
pub use observer::{
    define_reactive, del, observe, set, suspend_observation, traverse, warn_on_write, List,
    ListMethod, Object, Observer, Property, PropertyKind,
};
pub use reactive::{Dep, Effect, Memo, ReactiveContext, Signal, Subscriber, SubscriberId};
pub use value::{same_value, Key, Value};
