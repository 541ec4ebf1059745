//! Scoped teardown primitives for mount/unmount lifecycles.
//!
//! Every setup action that needs reversal hands a [`Disposer`] to the
//! [`OwningScope`] of its mount. Tearing the scope down runs each adopted
//! disposer exactly once, regardless of how many times teardown is
//! requested or on which exit path it happens.

use std::sync::Mutex;

/// A named teardown action that runs at most once.
///
/// Runs on explicit [`Disposer::dispose`] or, as a safety net, on drop.
pub struct Disposer {
    name: &'static str,
    action: Option<Box<dyn FnOnce() + Send>>,
}

impl Disposer {
    pub fn new(name: &'static str, action: impl FnOnce() + Send + 'static) -> Self {
        Self {
            name,
            action: Some(Box::new(action)),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Run the teardown action now.
    pub fn dispose(mut self) {
        self.run();
    }

    fn run(&mut self) {
        if let Some(action) = self.action.take() {
            log::debug!("disposing '{}'", self.name);
            action();
        }
    }
}

impl Drop for Disposer {
    fn drop(&mut self) {
        self.run();
    }
}

struct ScopeInner {
    torn_down: bool,
    disposers: Vec<Disposer>,
}

/// Collects disposers for one mount and releases them all on teardown.
///
/// Teardown is idempotent. A disposer adopted after teardown is run
/// immediately, so setup that completes late can never outlive its scope.
pub struct OwningScope {
    name: &'static str,
    inner: Mutex<ScopeInner>,
}

impl OwningScope {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            inner: Mutex::new(ScopeInner {
                torn_down: false,
                disposers: Vec::new(),
            }),
        }
    }

    /// Take ownership of a disposer for the lifetime of this scope.
    pub fn adopt(&self, disposer: Disposer) {
        {
            let mut inner = self.inner.lock().unwrap();
            if !inner.torn_down {
                inner.disposers.push(disposer);
                return;
            }
        }
        // Scope already exited; run the teardown right away so late
        // setup can never outlive it.
        log::debug!(
            "scope '{}' already torn down, disposing '{}' immediately",
            self.name,
            disposer.name()
        );
        disposer.dispose();
    }

    /// Run all adopted disposers, most recent first. Safe to call more
    /// than once; later calls do nothing.
    pub fn teardown(&self) {
        let mut drained = {
            let mut inner = self.inner.lock().unwrap();
            if inner.torn_down {
                return;
            }
            inner.torn_down = true;
            std::mem::take(&mut inner.disposers)
        };
        log::info!("tearing down scope '{}' ({} disposers)", self.name, drained.len());
        while let Some(disposer) = drained.pop() {
            disposer.dispose();
        }
    }

    pub fn is_torn_down(&self) -> bool {
        self.inner.lock().unwrap().torn_down
    }

    /// Number of disposers currently held.
    pub fn pending(&self) -> usize {
        self.inner.lock().unwrap().disposers.len()
    }
}

impl Drop for OwningScope {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let clone = count.clone();
        (count, move || {
            clone.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_dispose_runs_action_once() {
        let (count, action) = counter();
        let disposer = Disposer::new("test", action);
        disposer.dispose();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_runs_action() {
        let (count, action) = counter();
        {
            let _disposer = Disposer::new("test", action);
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_teardown_runs_all_disposers() {
        let scope = OwningScope::new("test");
        let (a, action_a) = counter();
        let (b, action_b) = counter();
        scope.adopt(Disposer::new("a", action_a));
        scope.adopt(Disposer::new("b", action_b));
        assert_eq!(scope.pending(), 2);

        scope.teardown();
        assert_eq!(a.load(Ordering::SeqCst), 1);
        assert_eq!(b.load(Ordering::SeqCst), 1);
        assert_eq!(scope.pending(), 0);
        assert!(scope.is_torn_down());
    }

    #[test]
    fn test_teardown_is_idempotent() {
        let scope = OwningScope::new("test");
        let (count, action) = counter();
        scope.adopt(Disposer::new("a", action));

        scope.teardown();
        scope.teardown();
        scope.teardown();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_adopt_after_teardown_disposes_immediately() {
        let scope = OwningScope::new("test");
        scope.teardown();

        let (count, action) = counter();
        scope.adopt(Disposer::new("late", action));
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(scope.pending(), 0);
    }

    #[test]
    fn test_scope_drop_tears_down() {
        let (count, action) = counter();
        {
            let scope = OwningScope::new("test");
            scope.adopt(Disposer::new("a", action));
        }
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_teardown_runs_most_recent_first() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let scope = OwningScope::new("test");
        for label in ["first", "second", "third"] {
            let order = order.clone();
            scope.adopt(Disposer::new(label, move || {
                order.lock().unwrap().push(label);
            }));
        }

        scope.teardown();
        assert_eq!(*order.lock().unwrap(), vec!["third", "second", "first"]);
    }
}
