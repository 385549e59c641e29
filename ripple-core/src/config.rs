//! Engine Configuration
//!
//! Configuration is installed per thread, because a reactive graph is driven
//! by a single logical thread. Installing a configuration returns a guard
//! that restores the previous one when dropped.
//!
//! ```rust,ignore
//! use ripple_core::Config;
//!
//! let _guard = Config::scoped(Config { silent: true, ..Config::default() });
//! // diagnostics are suppressed until `_guard` is dropped
//! ```

use std::cell::RefCell;

use serde::{Deserialize, Serialize};

/// Default bound on consecutive self-triggered re-runs of one computation.
pub const DEFAULT_MAX_UPDATE_COUNT: usize = 100;

/// Engine-wide knobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Suppress diagnostics. Release builds are silent by default.
    pub silent: bool,

    /// How many follow-up runs a computation may trigger on itself before
    /// the engine gives up and reports an update loop.
    pub max_update_count: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            silent: cfg!(not(debug_assertions)),
            max_update_count: DEFAULT_MAX_UPDATE_COUNT,
        }
    }
}

thread_local! {
    static CURRENT: RefCell<Config> = RefCell::new(Config::default());
}

impl Config {
    /// Get a copy of the configuration active on this thread.
    pub fn current() -> Config {
        CURRENT.with(|current| current.borrow().clone())
    }

    /// Install `config` on this thread until the returned guard is dropped.
    pub fn scoped(config: Config) -> ConfigGuard {
        let previous = CURRENT.with(|current| current.replace(config));
        ConfigGuard {
            previous: Some(previous),
        }
    }

    pub(crate) fn is_silent() -> bool {
        CURRENT.with(|current| current.borrow().silent)
    }

    pub(crate) fn max_update_count() -> usize {
        CURRENT.with(|current| current.borrow().max_update_count)
    }
}

/// Restores the previously installed [`Config`] when dropped.
#[must_use = "the configuration is reverted as soon as the guard is dropped"]
pub struct ConfigGuard {
    previous: Option<Config>,
}

impl Drop for ConfigGuard {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            CURRENT.with(|current| {
                *current.borrow_mut() = previous;
            });
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
