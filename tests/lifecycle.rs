use std::cell::Cell;
use std::rc::Rc;

use tracked_settings::{
    ChangeEmitter, ChangeEvent, DisposalScope, FieldValue, LaunchWindowAction, ManagerSettings,
    SettingsSnapshot, Subscription, EXTENDER_SCHEMA, MANAGER_SCHEMA, TAB_EXTENDER,
};

// =============================================================================
// FULL SESSION FLOW
// =============================================================================

#[test]
fn test_preferences_session_flow() {
    // Startup: load persisted values with the surface closed.
    let settings = ManagerSettings::new();
    let loaded = SettingsSnapshot {
        manager: {
            let mut m = tracked_settings::ManagerFields::default();
            m.game_data_path = "C:\\BG3\\Data".into();
            m.dark_theme_enabled = false;
            m
        },
        extender: {
            let mut e = tracked_settings::ExtenderFields::default();
            e.enable_logging = true;
            e
        },
    };
    settings.load_from(loaded);

    assert_eq!(settings.game_data_path(), "C:\\BG3\\Data");
    assert!(!settings.dark_theme_enabled());
    assert!(settings.extender().enable_logging());
    assert!(!settings.is_dirty(), "load must not dirty");

    // User opens the preferences panel and edits.
    settings.set_surface_open(true);
    settings.set_telemetry_disabled(true);
    settings.extender().set_developer_mode(true);
    assert!(settings.is_dirty());

    // Save: snapshot, persist, clear.
    let saved = settings.snapshot();
    assert!(saved.manager.telemetry_disabled);
    assert!(saved.extender.developer_mode);
    settings.clear_dirty();

    // Panel closes; later background updates stay clean.
    settings.set_surface_open(false);
    settings.set_last_update_check(1_756_252_800);
    assert!(!settings.is_dirty());
    assert_eq!(settings.last_update_check(), 1_756_252_800);
}

#[test]
fn test_snapshot_round_trips_through_json() {
    let settings = ManagerSettings::new();
    settings.set_workshop_path("C:\\Workshop");
    settings.set_action_on_game_launch(LaunchWindowAction::Minimize);
    settings.extender().set_debugger_port(7777);

    let json = serde_json::to_string(&settings.snapshot()).unwrap();

    // Serialized member names, not Rust field names.
    assert!(json.contains("\"WorkshopPath\""));
    assert!(json.contains("\"ExtenderSettings\""));
    assert!(json.contains("\"DebuggerPort\":7777"));
    // Transient state never reaches disk.
    assert!(!json.contains("SelectedTabIndex"));
    assert!(!json.contains("DetectedVersion"));

    let restored = ManagerSettings::new();
    restored.load_from(serde_json::from_str(&json).unwrap());
    assert_eq!(restored.workshop_path(), "C:\\Workshop");
    assert_eq!(
        restored.action_on_game_launch(),
        LaunchWindowAction::Minimize
    );
    assert_eq!(restored.extender().debugger_port(), 7777);
}

#[test]
fn test_partial_json_fills_defaults() {
    // A settings file from an older release is missing newer members.
    let snapshot: SettingsSnapshot =
        serde_json::from_str(r#"{"GameDataPath":"D:\\Data"}"#).unwrap();
    assert_eq!(snapshot.manager.game_data_path, "D:\\Data");
    assert_eq!(snapshot.manager.load_order_path, "Orders");
    assert!(snapshot.extender.enable_extensions);
    assert_eq!(snapshot.extender.debugger_port, 9999);
}

// =============================================================================
// DISPOSAL
// =============================================================================

#[test]
fn test_dispose_silences_everything() {
    let settings = ManagerSettings::new();
    settings.set_surface_open(true);

    let hits = Rc::new(Cell::new(0));
    let probe = hits.clone();
    let _sub = settings
        .observe_field("GameDataPath", move |_| probe.set(probe.get() + 1))
        .unwrap();

    settings.set_game_data_path("before");
    assert_eq!(hits.get(), 1);
    settings.clear_dirty();

    settings.dispose();
    settings.dispose(); // idempotent

    // Mutation still works, observation does not.
    settings.set_game_data_path("after");
    settings.extender().set_enable_logging(true);
    assert_eq!(settings.game_data_path(), "after");
    assert_eq!(hits.get(), 1);
    assert!(!settings.is_dirty());
    assert!(settings.is_disposed());
}

#[test]
fn test_scope_releases_cross_object_subscriptions() {
    let settings = ManagerSettings::new();
    let scope = DisposalScope::new();

    let hits = Rc::new(Cell::new(0));
    let probe = hits.clone();
    scope.add(
        settings
            .observe_field("LogEnabled", move |_| probe.set(probe.get() + 1))
            .unwrap(),
    );

    settings.set_log_enabled(true);
    assert_eq!(hits.get(), 1);

    scope.dispose();
    settings.set_log_enabled(false);
    assert_eq!(hits.get(), 1);
}

#[test]
fn test_subscription_drop_is_enough() {
    let settings = ManagerSettings::new();
    let hits = Rc::new(Cell::new(0));

    {
        let probe = hits.clone();
        let _sub: Subscription = settings
            .observe_field("DarkThemeEnabled", move |_| probe.set(probe.get() + 1))
            .unwrap();
        settings.set_dark_theme_enabled(false);
        assert_eq!(hits.get(), 1);
    }

    settings.set_dark_theme_enabled(true);
    assert_eq!(hits.get(), 1);
}

// =============================================================================
// NESTED REPLACEMENT
// =============================================================================

#[test]
fn test_reset_swaps_tracking_atomically() {
    let settings = ManagerSettings::new();
    settings.set_surface_open(true);

    let old = settings.extender();
    settings.reset_extender_settings();
    settings.clear_dirty();

    // The released instance is inert on every path: dirty and derived.
    old.set_log_directory("C:\\Stale");
    assert!(!settings.is_dirty());
    assert_ne!(settings.extender_log_directory(), "C:\\Stale");

    // The replacement is live on both paths.
    settings.extender().set_log_directory("C:\\Fresh");
    assert!(settings.is_dirty());
    assert_eq!(settings.extender_log_directory(), "C:\\Fresh");
}

#[test]
fn test_extender_handles_share_one_instance() {
    let settings = ManagerSettings::new();
    let a = settings.extender();
    let b = settings.extender();

    a.set_debugger_port(1111);
    assert_eq!(b.debugger_port(), 1111);
}

// =============================================================================
// CHANGE EVENTS
// =============================================================================

#[test]
fn test_events_carry_old_and_new_values() {
    let settings = ManagerSettings::new();
    let seen: Rc<Cell<Option<(FieldValue, FieldValue)>>> = Rc::new(Cell::new(None));

    let probe = seen.clone();
    let _sub = settings
        .observe_field("LastOrder", move |event: &ChangeEvent| {
            probe.set(Some((event.previous.clone(), event.value.clone())))
        })
        .unwrap();

    settings.set_last_order("Main");
    let (previous, value) = seen.take().unwrap();
    assert_eq!(previous, FieldValue::from(""));
    assert_eq!(value, FieldValue::from("Main"));
}

#[test]
fn test_derived_fields_emit_like_any_other() {
    let settings = ManagerSettings::new();
    let hits = Rc::new(Cell::new(0));

    let probe = hits.clone();
    let _sub = settings
        .observe_field("ExtenderTabVisible", move |_| probe.set(probe.get() + 1))
        .unwrap();

    settings.set_selected_tab_index(TAB_EXTENDER);
    assert_eq!(hits.get(), 1);

    // Same index again: no value change anywhere, no event.
    settings.set_selected_tab_index(TAB_EXTENDER);
    assert_eq!(hits.get(), 1);
}

#[test]
fn test_listener_mutation_during_emit_is_safe() {
    // A listener that writes another field mid-notification must not
    // trip a borrow panic and must see the derived state settled.
    let settings = ManagerSettings::new();
    let settings2 = settings.clone();

    let _sub = settings
        .observe_field("GameMasterModeEnabled", move |event| {
            if event.value == FieldValue::Bool(true) {
                settings2.set_auto_load_gm_campaign_mods(true);
            }
        })
        .unwrap();

    settings.set_game_master_mode_enabled(true);
    assert!(settings.auto_load_gm_campaign_mods());
}

// =============================================================================
// SCHEMA
// =============================================================================

#[test]
fn test_schemas_are_exposed_to_collaborators() {
    let persisted = MANAGER_SCHEMA
        .iter()
        .filter(|def| def.kind == tracked_settings::FieldKind::Persisted)
        .count();
    assert_eq!(persisted, 22);

    let persisted = EXTENDER_SCHEMA
        .iter()
        .filter(|def| def.kind == tracked_settings::FieldKind::Persisted)
        .count();
    assert_eq!(persisted, 8);
}

#[test]
fn test_raw_emitter_and_settings_compose() {
    // The reactive layer is usable on its own for ad-hoc coordination.
    let emitter = ChangeEmitter::new();
    let hits = Rc::new(Cell::new(0));

    let probe = hits.clone();
    let _sub = emitter.subscribe("Custom", move |_| probe.set(probe.get() + 1));
    emitter.emit(ChangeEvent {
        field: "Custom",
        previous: FieldValue::Int(0),
        value: FieldValue::Int(1),
    });
    assert_eq!(hits.get(), 1);
}
