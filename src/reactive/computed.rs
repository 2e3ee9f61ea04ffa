// ============================================================================
// tracked-settings - Computed-Field Binder
// One-way bindings from declared source fields to a derived target field
// ============================================================================
//
// A binding declares that a target field's value is a pure function of one
// or more source fields. The binder evaluates the function once at bind
// time (construction-time consistency) and re-runs it synchronously inside
// every source change, so no stale read is observable once the triggering
// setter returns.
//
// Sources are declared, not autotracked, which makes the dependency graph
// checkable: a binding that would let a target feed back into its own
// sources is rejected at bind time, before any subscription exists. The
// emitter's notify-depth guard stays as the runtime backstop.
// ============================================================================

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::core::types::SettingsError;
use crate::reactive::emitter::ChangeEmitter;
use crate::reactive::scope::Subscription;

// =============================================================================
// BINDING GRAPH
// =============================================================================

struct BindingEdge {
    target: &'static str,
    sources: Vec<&'static str>,
}

/// Registry of computed-field bindings for one settings object.
#[derive(Default)]
pub struct ComputedBindings {
    edges: RefCell<Vec<BindingEdge>>,
}

impl ComputedBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a one-way binding and wire it up.
    ///
    /// `recompute` must be pure with respect to the binding graph: it reads
    /// the sources and writes only `target`. The closure runs once
    /// immediately, then once per source change, always before the mutating
    /// call returns.
    ///
    /// Fails with [`SettingsError::CyclicDerivation`] when the declared
    /// edges would form a cycle; nothing is registered in that case.
    pub fn bind(
        &self,
        emitter: &ChangeEmitter,
        target: &'static str,
        sources: &[&'static str],
        recompute: impl Fn() + 'static,
    ) -> Result<Vec<Subscription>, SettingsError> {
        if self.would_cycle(target, sources) {
            return Err(SettingsError::CyclicDerivation { field: target });
        }

        // Re-binding the same edge (nested instance replacement) must not
        // grow the graph.
        let mut edges = self.edges.borrow_mut();
        let duplicate = edges
            .iter()
            .any(|edge| edge.target == target && edge.sources == sources);
        if !duplicate {
            edges.push(BindingEdge {
                target,
                sources: sources.to_vec(),
            });
        }
        drop(edges);

        let recompute: Rc<dyn Fn()> = Rc::new(recompute);
        recompute();

        let subscriptions = sources
            .iter()
            .map(|&source| {
                let recompute = recompute.clone();
                emitter.subscribe(source, move |_| recompute())
            })
            .collect();

        Ok(subscriptions)
    }

    /// Would adding `sources -> target` close a cycle? True when the target
    /// already (transitively) feeds one of the sources, or names itself.
    fn would_cycle(&self, target: &'static str, sources: &[&'static str]) -> bool {
        sources
            .iter()
            .any(|&source| source == target || self.reaches(target, source))
    }

    fn reaches(&self, from: &str, to: &str) -> bool {
        let edges = self.edges.borrow();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut stack = vec![from];

        while let Some(node) = stack.pop() {
            if node == to {
                return true;
            }
            if !visited.insert(node) {
                continue;
            }
            for edge in edges.iter() {
                if edge.sources.iter().any(|&s| s == node) {
                    stack.push(edge.target);
                }
            }
        }
        false
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{ChangeEvent, FieldValue};
    use std::cell::Cell;

    fn event(field: &'static str, value: i64) -> ChangeEvent {
        ChangeEvent {
            field,
            previous: FieldValue::Int(0),
            value: FieldValue::Int(value),
        }
    }

    #[test]
    fn bind_evaluates_immediately() {
        let emitter = ChangeEmitter::new();
        let bindings = ComputedBindings::new();
        let runs = Rc::new(Cell::new(0));

        let probe = runs.clone();
        let _subs = bindings
            .bind(&emitter, "Target", &["Source"], move || {
                probe.set(probe.get() + 1)
            })
            .unwrap();

        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn source_change_recomputes_synchronously() {
        let emitter = ChangeEmitter::new();
        let bindings = ComputedBindings::new();

        let source_value = Rc::new(Cell::new(0i64));
        let target_value = Rc::new(Cell::new(0i64));

        let (src, tgt) = (source_value.clone(), target_value.clone());
        let _subs = bindings
            .bind(&emitter, "Doubled", &["Base"], move || tgt.set(src.get() * 2))
            .unwrap();

        source_value.set(21);
        emitter.emit(event("Base", 21));

        // Recompute already happened inside the emit.
        assert_eq!(target_value.get(), 42);
    }

    #[test]
    fn binding_with_multiple_sources_tracks_each() {
        let emitter = ChangeEmitter::new();
        let bindings = ComputedBindings::new();
        let runs = Rc::new(Cell::new(0));

        let probe = runs.clone();
        let _subs = bindings
            .bind(&emitter, "Sum", &["A", "B"], move || {
                probe.set(probe.get() + 1)
            })
            .unwrap();
        assert_eq!(runs.get(), 1);

        emitter.emit(event("A", 1));
        emitter.emit(event("B", 2));
        assert_eq!(runs.get(), 3);
    }

    #[test]
    fn recompute_writing_a_tracked_target_dirties_in_the_same_call() {
        use crate::reactive::dirty::DirtyTracker;

        let emitter = ChangeEmitter::new();
        let bindings = ComputedBindings::new();
        let tracker = DirtyTracker::new();

        // The derived target is itself in the tracked set.
        let _track = tracker
            .attach(&emitter, &["Resolved"], || true)
            .unwrap();

        let weak = emitter.downgrade();
        let _subs = bindings
            .bind(&emitter, "Resolved", &["Base"], move || {
                if let Some(emitter) = weak.upgrade() {
                    emitter.emit(event("Resolved", 1));
                }
            })
            .unwrap();

        // The initial evaluation already emitted the target once.
        assert!(tracker.is_dirty());
        tracker.clear();

        // A source change recomputes, which re-emits the target, which
        // sets the flag before this emit returns.
        emitter.emit(event("Base", 2));
        assert!(tracker.is_dirty());
    }

    #[test]
    fn self_referential_binding_is_rejected() {
        let emitter = ChangeEmitter::new();
        let bindings = ComputedBindings::new();

        let err = bindings
            .bind(&emitter, "A", &["A"], || {})
            .unwrap_err();
        assert_eq!(err, SettingsError::CyclicDerivation { field: "A" });
        assert_eq!(emitter.listener_count("A"), 0);
    }

    #[test]
    fn transitive_cycle_is_rejected_at_bind_time() {
        let emitter = ChangeEmitter::new();
        let bindings = ComputedBindings::new();

        // A -> B is fine, B -> C is fine, C -> A would close the loop.
        let _ab = bindings.bind(&emitter, "B", &["A"], || {}).unwrap();
        let _bc = bindings.bind(&emitter, "C", &["B"], || {}).unwrap();

        let err = bindings.bind(&emitter, "A", &["C"], || {}).unwrap_err();
        assert_eq!(err, SettingsError::CyclicDerivation { field: "A" });

        // The failed bind registered nothing.
        assert_eq!(emitter.listener_count("C"), 0);
    }

    #[test]
    fn rebinding_the_same_edge_does_not_grow_the_graph() {
        let emitter = ChangeEmitter::new();
        let bindings = ComputedBindings::new();

        let first = bindings.bind(&emitter, "T", &["S"], || {}).unwrap();
        drop(first);
        let _second = bindings.bind(&emitter, "T", &["S"], || {}).unwrap();

        assert_eq!(bindings.edges.borrow().len(), 1);
        assert_eq!(emitter.listener_count("S"), 1);
    }

    #[test]
    fn dropping_subscriptions_stops_recompute() {
        let emitter = ChangeEmitter::new();
        let bindings = ComputedBindings::new();
        let runs = Rc::new(Cell::new(0));

        let probe = runs.clone();
        let subs = bindings
            .bind(&emitter, "T", &["S"], move || probe.set(probe.get() + 1))
            .unwrap();
        assert_eq!(runs.get(), 1);

        drop(subs);
        emitter.emit(event("S", 1));
        assert_eq!(runs.get(), 1);
    }
}
