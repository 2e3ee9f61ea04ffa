// ============================================================================
// tracked-settings - Property Change Emitter
// Per-instance field change notification
// ============================================================================
//
// Every settings object owns one ChangeEmitter: a map from field name to an
// ordered list of listener callbacks, invoked synchronously in registration
// order when the field mutates. This is the whole notification surface -
// there is no dependency autotracking, no scheduler and no deferral. By the
// time a setter returns, every listener has run.
//
// Listeners are snapshotted before invocation (collect-then-invoke), so a
// listener may subscribe, unsubscribe or emit again without tripping a
// RefCell borrow. Re-entrant emits are depth-guarded: a derivation cycle
// that escapes the bind-time check panics instead of overflowing the stack.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use crate::core::constants::MAX_NOTIFY_DEPTH;
use crate::core::types::ChangeEvent;
use crate::reactive::scope::Subscription;

/// Listener callback invoked with each change event.
pub type ListenerFn = dyn Fn(&ChangeEvent);

// =============================================================================
// EMITTER INNER
// =============================================================================

struct EmitterInner {
    /// Field name -> ordered listener list. Each entry keeps the id its
    /// Subscription removes it by.
    listeners: RefCell<HashMap<&'static str, Vec<(u64, Rc<ListenerFn>)>>>,

    /// Next subscription id.
    next_id: Cell<u64>,

    /// Current re-entrant emit depth.
    depth: Cell<u32>,

    /// Set once the owning settings object is disposed. A closed emitter
    /// accepts no listeners and emits nothing.
    closed: Cell<bool>,
}

impl EmitterInner {
    fn remove(&self, field: &'static str, id: u64) {
        let mut listeners = self.listeners.borrow_mut();
        if let Some(list) = listeners.get_mut(field) {
            list.retain(|(entry_id, _)| *entry_id != id);
            if list.is_empty() {
                listeners.remove(field);
            }
        }
    }
}

// =============================================================================
// CHANGE EMITTER (Public handle)
// =============================================================================

/// Handle to a per-instance change emitter. Cloning the handle shares the
/// same listener table.
#[derive(Clone)]
pub struct ChangeEmitter {
    inner: Rc<EmitterInner>,
}

impl Default for ChangeEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeEmitter {
    pub fn new() -> Self {
        Self {
            inner: Rc::new(EmitterInner {
                listeners: RefCell::new(HashMap::new()),
                next_id: Cell::new(0),
                depth: Cell::new(0),
                closed: Cell::new(false),
            }),
        }
    }

    /// Downgrade to a weak handle. Listeners that write back through their
    /// own emitter hold one of these so the listener table never owns
    /// itself.
    pub fn downgrade(&self) -> WeakChangeEmitter {
        WeakChangeEmitter {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Register a listener for one field.
    ///
    /// Listeners run synchronously, in registration order, inside the
    /// mutating call. The returned [`Subscription`] removes the listener
    /// when released. Subscribing to a closed emitter returns an inert
    /// subscription.
    pub fn subscribe(
        &self,
        field: &'static str,
        listener: impl Fn(&ChangeEvent) + 'static,
    ) -> Subscription {
        if self.inner.closed.get() {
            return Subscription::new(|| {});
        }

        let id = self.inner.next_id.get();
        self.inner.next_id.set(id + 1);

        self.inner
            .listeners
            .borrow_mut()
            .entry(field)
            .or_default()
            .push((id, Rc::new(listener)));

        let weak = Rc::downgrade(&self.inner);
        Subscription::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.remove(field, id);
            }
        })
    }

    /// Deliver a change event to every listener of `event.field`.
    ///
    /// # Panics
    ///
    /// Panics when re-entrant emits exceed [`MAX_NOTIFY_DEPTH`], which only
    /// happens when computed fields form a derivation cycle - a programming
    /// error that must fail fast rather than loop.
    pub fn emit(&self, event: ChangeEvent) {
        if self.inner.closed.get() {
            return;
        }

        let depth = self.inner.depth.get();
        if depth >= MAX_NOTIFY_DEPTH {
            panic!(
                "change notification for `{}` exceeded depth {MAX_NOTIFY_DEPTH}: \
                 computed fields form a derivation cycle",
                event.field
            );
        }

        // Snapshot the listener list so listeners can mutate registrations
        // (or emit again) while we iterate.
        let snapshot: Vec<Rc<ListenerFn>> = self
            .inner
            .listeners
            .borrow()
            .get(event.field)
            .map(|list| list.iter().map(|(_, f)| f.clone()).collect())
            .unwrap_or_default();

        self.inner.depth.set(depth + 1);
        let _restore = DepthRestore {
            depth: &self.inner.depth,
            prev: depth,
        };
        for listener in &snapshot {
            listener(&event);
        }
    }

    /// Number of live listeners for a field.
    pub fn listener_count(&self, field: &str) -> usize {
        self.inner
            .listeners
            .borrow()
            .get(field)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Drop every listener and make the emitter permanently inert.
    ///
    /// Called on disposal: afterwards mutation is still well-defined, just
    /// silent - no previously attached listener can observe it.
    pub fn close(&self) {
        self.inner.closed.set(true);
        self.inner.listeners.borrow_mut().clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.get()
    }
}

/// Restores the emit depth when the listener loop exits, including by
/// unwind. A panicking listener must not leave the counter elevated.
struct DepthRestore<'a> {
    depth: &'a Cell<u32>,
    prev: u32,
}

impl Drop for DepthRestore<'_> {
    fn drop(&mut self) {
        self.depth.set(self.prev);
    }
}

// =============================================================================
// WEAK HANDLE
// =============================================================================

/// Weak counterpart of [`ChangeEmitter`].
#[derive(Clone)]
pub struct WeakChangeEmitter {
    inner: Weak<EmitterInner>,
}

impl WeakChangeEmitter {
    pub fn upgrade(&self) -> Option<ChangeEmitter> {
        self.inner.upgrade().map(|inner| ChangeEmitter { inner })
    }
}

// =============================================================================
// TESTS
// =============================================================================
