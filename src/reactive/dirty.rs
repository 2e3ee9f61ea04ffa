// ============================================================================
// tracked-settings - Dirty Tracker
// Gated save-needed flag fed by persisted field changes
// ============================================================================
//
// The tracker subscribes to a settings object's emitter for every persisted
// field name the registry reports. Each qualifying change sets a shared
// boolean flag - but only while the gate (the "settings surface is open"
// predicate) holds. Changes always apply to the field either way; only the
// dirty signaling is gated, so populating fields during initial load never
// marks the object dirty.
//
// The flag transitions back to false only through clear() (after the
// persistence collaborator saves) or by reconstructing the object.
// ============================================================================

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::reactive::emitter::ChangeEmitter;
use crate::reactive::scope::Subscription;

// =============================================================================
// DIRTY TRACKER
// =============================================================================

/// Owns the save-needed flag for one root settings object.
#[derive(Default)]
pub struct DirtyTracker {
    flag: Rc<Cell<bool>>,
    attached: Cell<bool>,
}

impl DirtyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any gated persisted change has happened since the last
    /// [`clear`](Self::clear).
    pub fn is_dirty(&self) -> bool {
        self.flag.get()
    }

    /// Reset the flag. Called by the persistence collaborator after a
    /// successful save.
    pub fn clear(&self) {
        if self.flag.replace(false) {
            debug!("dirty flag cleared");
        }
    }

    /// One-shot attachment to a settings object's own emitter.
    ///
    /// Subscribes the flag-setting listener to every field in `fields` and
    /// returns the subscriptions for the caller's disposal scope. A second
    /// attachment on the same tracker returns `None` without registering
    /// anything, so the flag-set logic can never double-fire.
    pub fn attach(
        &self,
        emitter: &ChangeEmitter,
        fields: &[&'static str],
        gate: impl Fn() -> bool + Clone + 'static,
    ) -> Option<Vec<Subscription>> {
        if self.attached.replace(true) {
            return None;
        }
        Some(self.observe(emitter, fields, gate))
    }

    /// Subscribe the flag-setting listener to `fields` on `emitter` without
    /// the one-shot guard.
    ///
    /// Used for nested settings objects (their persisted changes feed the
    /// same root flag) and for re-establishing subscriptions when a nested
    /// instance is replaced.
    pub fn observe(
        &self,
        emitter: &ChangeEmitter,
        fields: &[&'static str],
        gate: impl Fn() -> bool + Clone + 'static,
    ) -> Vec<Subscription> {
        fields
            .iter()
            .map(|&field| {
                let flag = self.flag.clone();
                let gate = gate.clone();
                emitter.subscribe(field, move |event| {
                    if !gate() {
                        return;
                    }
                    if !flag.replace(true) {
                        debug!(field = event.field, "settings marked dirty");
                    }
                })
            })
            .collect()
    }

    /// Directly mark dirty through the gate, without a field event.
    ///
    /// Used by the controlled nested-replacement path: swapping in a fresh
    /// nested instance is itself a persisted-state change.
    pub fn mark(&self, gate_open: bool) {
        if gate_open && !self.flag.replace(true) {
            debug!("settings marked dirty (nested instance replaced)");
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
