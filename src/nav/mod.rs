//! Global navigation hook.
//!
//! Imperative code (menu handlers, other windows, background tasks) often
//! needs to request navigation without holding a reference to the router.
//! A [`NavigationRegistry`] is the indirection point: the shell installs a
//! closure over the real router while mounted and uninstalls it on
//! teardown, and anyone holding the registry can [`invoke`] a target.
//!
//! Installing is last-writer-wins and invoking with nothing installed is a
//! silent no-op, so callers never have to care whether a shell is up.
//!
//! [`invoke`]: NavigationRegistry::invoke

use arc_swap::ArcSwapOption;
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;

/// An opaque navigation destination. The only validation is that the path
/// is non-empty; routing semantics belong to the router.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationTarget(String);

impl NavigationTarget {
    /// Returns `None` for an empty path.
    pub fn new(path: impl Into<String>) -> Option<Self> {
        let path = path.into();
        if path.is_empty() { None } else { Some(Self(path)) }
    }

    pub fn path(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NavigationTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

type NavigateFn = dyn Fn(NavigationTarget) + Send + Sync;

/// Holds at most one navigation function. Lock-free on every operation,
/// safe to share across threads and windows.
pub struct NavigationRegistry {
    handler: ArcSwapOption<Box<NavigateFn>>,
}

impl NavigationRegistry {
    pub fn new() -> Self {
        Self {
            handler: ArcSwapOption::from(None),
        }
    }

    /// Install a navigation function, replacing any previous one.
    pub fn install<F>(&self, navigate: F)
    where
        F: Fn(NavigationTarget) + Send + Sync + 'static,
    {
        let boxed: Box<NavigateFn> = Box::new(navigate);
        let previous = self.handler.swap(Some(Arc::new(boxed)));
        if previous.is_some() {
            log::debug!("navigation hook replaced");
        } else {
            log::debug!("navigation hook installed");
        }
    }

    /// Clear the installed function. Does nothing if none is installed.
    pub fn uninstall(&self) {
        let previous = self.handler.swap(None);
        if previous.is_some() {
            log::debug!("navigation hook uninstalled");
        }
    }

    /// Dispatch a target to the installed function. Returns whether a
    /// function was there to receive it; with none installed this is a
    /// no-op.
    pub fn invoke(&self, target: NavigationTarget) -> bool {
        match self.handler.load_full() {
            Some(navigate) => {
                log::debug!("navigating to '{}'", target);
                navigate(target);
                true
            }
            None => {
                log::debug!("navigation to '{}' dropped, no hook installed", target);
                false
            }
        }
    }

    pub fn installed(&self) -> bool {
        self.handler.load().is_some()
    }
}

impl Default for NavigationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static GLOBAL_NAVIGATION: Lazy<Arc<NavigationRegistry>> =
    Lazy::new(|| Arc::new(NavigationRegistry::new()));

/// The process-wide default registry. Components that want isolation
/// (tests, embedded shells) construct their own instead.
pub fn global_navigation() -> Arc<NavigationRegistry> {
    Arc::clone(&GLOBAL_NAVIGATION)
}
