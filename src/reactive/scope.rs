// ============================================================================
// tracked-settings - Disposal Scope
// Scoped ownership of change subscriptions with guaranteed release
// ============================================================================
//
// A Subscription is an RAII guard around one unsubscribe closure: dropping
// it (or calling unsubscribe()) removes the listener it stands for, exactly
// once. A DisposalScope owns a batch of subscriptions so an entire settings
// object can release everything in a single dispose() pass. Disposal is
// idempotent and also runs on Drop, so no exit path leaks a listener.
// ============================================================================

use std::cell::{Cell, RefCell};

use tracing::trace;

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Handle for one registered listener. Releasing the handle removes the
/// listener; the release runs at most once.
pub struct Subscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wrap an unsubscribe closure.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Explicitly release the subscription. Equivalent to dropping it.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("live", &self.release.is_some())
            .finish()
    }
}

// =============================================================================
// DISPOSAL SCOPE
// =============================================================================

/// Owning collection of subscriptions, released together.
///
/// `dispose()` releases every owned subscription exactly once; calling it
/// again is a no-op. Subscriptions added after disposal are released
/// immediately, so a late registration can never outlive the scope.
#[derive(Default)]
pub struct DisposalScope {
    subscriptions: RefCell<Vec<Subscription>>,
    disposed: Cell<bool>,
}

impl DisposalScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `dispose()` has already run.
    pub fn is_disposed(&self) -> bool {
        self.disposed.get()
    }

    /// Number of live subscriptions owned by this scope.
    pub fn len(&self) -> usize {
        self.subscriptions.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.borrow().is_empty()
    }

    /// Take ownership of a subscription for the lifetime of this scope.
    pub fn add(&self, subscription: Subscription) {
        if self.disposed.get() {
            // Scope already torn down: release right away.
            drop(subscription);
            return;
        }
        self.subscriptions.borrow_mut().push(subscription);
    }

    /// Take ownership of a batch of subscriptions.
    pub fn add_all(&self, subscriptions: impl IntoIterator<Item = Subscription>) {
        for subscription in subscriptions {
            self.add(subscription);
        }
    }

    /// Release every owned subscription. Safe to call any number of times;
    /// only the first call does work.
    pub fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        let subscriptions: Vec<_> = self.subscriptions.borrow_mut().drain(..).collect();
        trace!(count = subscriptions.len(), "disposing subscription scope");
        drop(subscriptions);
    }
}

impl Drop for DisposalScope {
    fn drop(&mut self) {
        self.dispose();
    }
}

// =============================================================================
// TESTS
// =============================================================================
