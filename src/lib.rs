// ============================================================================
// tracked-settings
// Reactive application settings: change events, gated dirty tracking,
// computed fields and nested composition
// ============================================================================
//
// The crate has two layers. The reactive layer is generic plumbing:
// a per-object change emitter, a disposal scope for subscription lifetimes,
// a dirty tracker gated on an externally-owned flag, and a binder for
// derived fields with a statically-checked dependency graph. The settings
// layer declares the concrete objects on top of it: the root
// [`ManagerSettings`] and the nested [`ScriptExtenderSettings`], each with
// a static field schema splitting persisted from UI-only state.
//
// Everything is single-threaded by construction (`Rc`, `Cell`, `RefCell`);
// the types are deliberately not `Send`. Notification is synchronous and
// depth-guarded, so a listener never observes a stale derived value and a
// buggy feedback loop fails fast instead of hanging.
//
// ```
// use tracked_settings::ManagerSettings;
//
// let settings = ManagerSettings::new();
// settings.set_surface_open(true);
//
// settings.set_game_data_path("C:\\BG3\\Data");
// assert!(settings.is_dirty());
//
// settings.clear_dirty();
// settings.set_selected_tab_index(1);
// assert!(settings.extender_tab_visible());
// assert!(!settings.is_dirty()); // tab index is UI-only state
// ```
// ============================================================================

pub mod core;
pub mod reactive;
pub mod settings;

// Flat re-exports for the common path.
pub use crate::core::constants::{MAX_NOTIFY_DEPTH, TAB_EXTENDER, TAB_KEYBINDINGS};
pub use crate::core::schema::{FieldDef, EXTENDER_SCHEMA, MANAGER_SCHEMA};
pub use crate::core::types::{
    ChangeEvent, FieldKind, FieldValue, LaunchWindowAction, SettingsError,
};
pub use crate::reactive::computed::ComputedBindings;
pub use crate::reactive::dirty::DirtyTracker;
pub use crate::reactive::emitter::{ChangeEmitter, WeakChangeEmitter};
pub use crate::reactive::scope::{DisposalScope, Subscription};
pub use crate::settings::extender::{ExtenderFields, ScriptExtenderSettings};
pub use crate::settings::manager::{ManagerFields, ManagerSettings, SettingsSnapshot};

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doc_example_flow() {
        let settings = ManagerSettings::new();
        settings.set_surface_open(true);

        settings.set_game_data_path("C:\\BG3\\Data");
        assert!(settings.is_dirty());

        settings.clear_dirty();
        settings.set_selected_tab_index(TAB_EXTENDER);
        assert!(settings.extender_tab_visible());
        assert!(!settings.is_dirty());
    }

    #[test]
    fn re_exports_resolve() {
        let _ = ManagerSettings::new();
        let _ = ScriptExtenderSettings::new();
        let _ = ChangeEmitter::new();
        let _ = DisposalScope::new();
        let _ = DirtyTracker::new();
        let _ = ComputedBindings::new();
        assert!(!MANAGER_SCHEMA.is_empty());
        assert!(!EXTENDER_SCHEMA.is_empty());
    }
}
