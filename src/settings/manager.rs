// ============================================================================
// tracked-settings - Manager Settings
// Root settings object: dirty tracking, nested composition, computed fields
// ============================================================================
//
// ManagerSettings is the persisted, strongly-typed settings object behind
// the application's preferences panel. Construction wires three things:
//
//   1. the dirty tracker over every persisted field name the registry
//      reports, gated on the "settings surface is open" flag,
//   2. the same tracking over the nested script-extender object's persisted
//      fields, feeding the root flag,
//   3. the computed fields: the two tab-visibility booleans derived from the
//      selected tab index, and the derived log-directory path that falls
//      back to the platform documents folder when the nested override is
//      blank.
//
// Every subscription lands in a disposal scope. dispose() releases them all
// and closes the emitters; afterwards the object is a plain data holder -
// fields stay settable, nothing is notified.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::path::PathBuf;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants::{EXTENDER_LOG_FOLDER, TAB_EXTENDER, TAB_KEYBINDINGS};
use crate::core::schema::{self, field, FieldDef};
use crate::core::types::{ChangeEvent, FieldValue, LaunchWindowAction, SettingsError};
use crate::reactive::computed::ComputedBindings;
use crate::reactive::dirty::DirtyTracker;
use crate::reactive::emitter::{ChangeEmitter, WeakChangeEmitter};
use crate::reactive::scope::{DisposalScope, Subscription};
use crate::settings::extender::{
    expect_bool, expect_int, expect_str, ExtenderFields, ScriptExtenderSettings,
};

// =============================================================================
// FIELD STORAGE
// =============================================================================

/// Plain data snapshot of the root settings fields. Persisted fields carry
/// their serialized member names; transient fields are skipped entirely.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerFields {
    #[serde(rename = "GameDataPath")]
    pub game_data_path: String,
    #[serde(rename = "GameExecutablePath")]
    pub game_executable_path: String,
    #[serde(rename = "GameStoryLogEnabled")]
    pub game_story_log_enabled: bool,
    #[serde(rename = "TelemetryDisabled")]
    pub telemetry_disabled: bool,
    #[serde(rename = "LaunchDX11")]
    pub launch_dx11: bool,
    #[serde(rename = "WorkshopPath")]
    pub workshop_path: String,
    #[serde(rename = "LoadOrderPath")]
    pub load_order_path: String,
    #[serde(rename = "LogEnabled")]
    pub log_enabled: bool,
    #[serde(rename = "CheckForUpdates")]
    pub check_for_updates: bool,
    #[serde(rename = "AutoAddDependenciesWhenExporting")]
    pub auto_add_dependencies: bool,
    #[serde(rename = "DisableMissingModWarnings")]
    pub disable_missing_mod_warnings: bool,
    #[serde(rename = "ShiftListFocusOnSwap")]
    pub shift_list_focus_on_swap: bool,
    #[serde(rename = "DisableWorkshopTagCheck")]
    pub disable_workshop_tag_check: bool,
    #[serde(rename = "LastUpdateCheck")]
    pub last_update_check: i64,
    #[serde(rename = "LastOrder")]
    pub last_order: String,
    #[serde(rename = "LastLoadedOrderFilePath")]
    pub last_loaded_order_file_path: String,
    #[serde(rename = "LastExtractOutputPath")]
    pub last_extract_output_path: String,
    #[serde(rename = "DarkThemeEnabled")]
    pub dark_theme_enabled: bool,
    #[serde(rename = "ActionOnGameLaunch")]
    pub action_on_game_launch: LaunchWindowAction,
    #[serde(rename = "ExportDefaultExtenderSettings")]
    pub export_default_extender_settings: bool,
    #[serde(rename = "DebugModeEnabled")]
    pub debug_mode_enabled: bool,
    #[serde(rename = "GameLaunchParams")]
    pub game_launch_params: String,

    // UI-only state, never saved.
    #[serde(skip)]
    pub auto_load_gm_campaign_mods: bool,
    #[serde(skip)]
    pub display_file_names: bool,
    #[serde(skip)]
    pub game_master_mode_enabled: bool,
    #[serde(skip)]
    pub selected_tab_index: i64,
    #[serde(skip)]
    pub extender_tab_visible: bool,
    #[serde(skip)]
    pub keybindings_tab_visible: bool,
    #[serde(skip)]
    pub extender_log_directory: String,
}

impl Default for ManagerFields {
    fn default() -> Self {
        Self {
            game_data_path: String::new(),
            game_executable_path: String::new(),
            game_story_log_enabled: false,
            telemetry_disabled: false,
            launch_dx11: false,
            workshop_path: String::new(),
            load_order_path: "Orders".into(),
            log_enabled: false,
            check_for_updates: true,
            auto_add_dependencies: true,
            disable_missing_mod_warnings: false,
            shift_list_focus_on_swap: false,
            disable_workshop_tag_check: false,
            last_update_check: -1,
            last_order: String::new(),
            last_loaded_order_file_path: String::new(),
            last_extract_output_path: String::new(),
            dark_theme_enabled: true,
            action_on_game_launch: LaunchWindowAction::None,
            export_default_extender_settings: false,
            debug_mode_enabled: false,
            game_launch_params: String::new(),
            auto_load_gm_campaign_mods: false,
            display_file_names: false,
            game_master_mode_enabled: false,
            selected_tab_index: 0,
            extender_tab_visible: false,
            keybindings_tab_visible: false,
            extender_log_directory: String::new(),
        }
    }
}

/// Everything the persistence collaborator reads and writes: the root
/// fields plus the nested extender block, under its serialized member name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsSnapshot {
    #[serde(flatten)]
    pub manager: ManagerFields,
    #[serde(rename = "ExtenderSettings")]
    pub extender: ExtenderFields,
}

// =============================================================================
// MANAGER SETTINGS (Public handle)
// =============================================================================

/// The root settings object. Cloning the handle shares the same instance.
#[derive(Clone)]
pub struct ManagerSettings {
    inner: Rc<ManagerInner>,
}

struct ManagerInner {
    fields: Rc<RefCell<ManagerFields>>,
    emitter: ChangeEmitter,
    tracker: DirtyTracker,
    surface_open: Rc<Cell<bool>>,
    bindings: ComputedBindings,

    /// The nested instance. Stable for the session except through
    /// reset_extender_settings(), the one controlled replacement path.
    extender: RefCell<ScriptExtenderSettings>,

    /// Root-lifetime subscriptions.
    scope: DisposalScope,

    /// Subscriptions bound to the current nested instance. Replaced as a
    /// whole when the instance is.
    extender_scope: RefCell<DisposalScope>,

    disposed: Cell<bool>,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl ManagerSettings {
    /// Construct with defaults and wire all tracking.
    pub fn new() -> Self {
        Self::from_snapshot(SettingsSnapshot::default())
    }

    /// Construct from loaded values and wire all tracking. The surface gate
    /// starts closed, so nothing here dirties.
    pub fn from_snapshot(snapshot: SettingsSnapshot) -> Self {
        let settings = Self {
            inner: Rc::new(ManagerInner {
                fields: Rc::new(RefCell::new(snapshot.manager)),
                emitter: ChangeEmitter::new(),
                tracker: DirtyTracker::new(),
                surface_open: Rc::new(Cell::new(false)),
                bindings: ComputedBindings::new(),
                extender: RefCell::new(ScriptExtenderSettings::from_fields(snapshot.extender)),
                scope: DisposalScope::new(),
                extender_scope: RefCell::new(DisposalScope::new()),
                disposed: Cell::new(false),
            }),
        };
        settings.wire();
        settings
    }

    fn gate(&self) -> impl Fn() -> bool + Clone + 'static {
        let open = self.inner.surface_open.clone();
        move || open.get()
    }

    fn wire(&self) {
        let inner = &self.inner;

        if let Some(subs) =
            inner
                .tracker
                .attach(&inner.emitter, schema::manager_persisted_fields(), self.gate())
        {
            inner.scope.add_all(subs);
        }

        self.bind_tab_visibility(field::EXTENDER_TAB_VISIBLE, TAB_EXTENDER, |f| {
            &mut f.extender_tab_visible
        });
        self.bind_tab_visibility(field::KEYBINDINGS_TAB_VISIBLE, TAB_KEYBINDINGS, |f| {
            &mut f.keybindings_tab_visible
        });

        self.observe_extender();
    }

    /// One tab-visibility binding: target boolean tracks
    /// `SelectedTabIndex == tab`. The two bindings are independent; neither
    /// knows about the other.
    fn bind_tab_visibility(
        &self,
        target: &'static str,
        tab: i64,
        slot: fn(&mut ManagerFields) -> &mut bool,
    ) {
        let fields = self.inner.fields.clone();
        let weak = self.inner.emitter.downgrade();
        let subs = self
            .inner
            .bindings
            .bind(
                &self.inner.emitter,
                target,
                &[field::SELECTED_TAB_INDEX],
                move || {
                    let visible = fields.borrow().selected_tab_index == tab;
                    recompute_bool(&fields, &weak, target, slot, visible);
                },
            )
            .expect("tab visibility bindings are acyclic by declaration");
        self.inner.scope.add_all(subs);
    }

    /// Observe the current nested instance: dirty tracking over its
    /// persisted fields plus the derived log-directory binding. All
    /// resulting subscriptions replace the previous nested-instance scope
    /// in one step.
    fn observe_extender(&self) {
        let extender = self.inner.extender.borrow().clone();
        let scope = DisposalScope::new();

        scope.add_all(self.inner.tracker.observe(
            extender.emitter(),
            schema::extender_persisted_fields(),
            self.gate(),
        ));

        let fields = self.inner.fields.clone();
        let weak = self.inner.emitter.downgrade();
        let source = extender.clone();
        let subs = self
            .inner
            .bindings
            .bind(
                extender.emitter(),
                field::EXTENDER_LOG_DIRECTORY,
                &[schema::extender_field::LOG_DIRECTORY],
                move || {
                    let resolved = resolve_log_directory(&source.log_directory());
                    recompute_str(
                        &fields,
                        &weak,
                        field::EXTENDER_LOG_DIRECTORY,
                        |f| &mut f.extender_log_directory,
                        resolved,
                    );
                },
            )
            .expect("log directory binding is acyclic by declaration");
        scope.add_all(subs);

        // Dropping the previous scope releases every subscription bound to
        // the old instance; the new instance is already fully observed.
        *self.inner.extender_scope.borrow_mut() = scope;
    }

    // -------------------------------------------------------------------------
    // Dirty flag and surface gate
    // -------------------------------------------------------------------------

    /// Whether any persisted field (root or nested) changed while the
    /// settings surface was open.
    pub fn is_dirty(&self) -> bool {
        self.inner.tracker.is_dirty()
    }

    /// Reset the dirty flag; called by the persistence collaborator after a
    /// successful save.
    pub fn clear_dirty(&self) {
        self.inner.tracker.clear();
    }

    /// Open or close the settings surface gate. Changes applied while the
    /// gate is closed (initial load, background updates) never dirty.
    pub fn set_surface_open(&self, open: bool) {
        self.inner.surface_open.set(open);
    }

    pub fn surface_open(&self) -> bool {
        self.inner.surface_open.get()
    }

    // -------------------------------------------------------------------------
    // Nested composition
    // -------------------------------------------------------------------------

    /// Handle to the nested script-extender settings. Identity is stable
    /// for the session except through
    /// [`reset_extender_settings`](Self::reset_extender_settings).
    pub fn extender(&self) -> ScriptExtenderSettings {
        self.inner.extender.borrow().clone()
    }

    /// Replace the nested instance with a defaults-constructed one.
    ///
    /// This is the single controlled replacement path: subscriptions bound
    /// to the old instance are released and the new instance is fully
    /// observed before this call returns, so the old instance can never
    /// feed the flag again and the new one is never silently ignored. The
    /// replacement itself counts as a persisted change.
    pub fn reset_extender_settings(&self) {
        let old = self.inner.extender.replace(ScriptExtenderSettings::new());
        old.emitter().close();

        if self.inner.disposed.get() {
            // Plain data holder after disposal: swap without wiring.
            self.inner.extender.borrow().emitter().close();
            return;
        }

        self.observe_extender();
        self.inner.tracker.mark(self.inner.surface_open.get());
        debug!("extender settings reset to defaults");
    }

    // -------------------------------------------------------------------------
    // Observation surface
    // -------------------------------------------------------------------------

    /// Subscribe to change events for one declared field. Unknown names
    /// fail fast.
    pub fn observe_field(
        &self,
        name: &str,
        listener: impl Fn(&ChangeEvent) + 'static,
    ) -> Result<Subscription, SettingsError> {
        let def = schema::MANAGER_SCHEMA
            .iter()
            .find(|def| def.name == name)
            .ok_or_else(|| SettingsError::UnknownField(name.to_owned()))?;
        Ok(self.inner.emitter.subscribe(def.name, listener))
    }

    /// Explicit developer-mode event.
    ///
    /// The debug-mode field is plain settings storage; subsystems that need
    /// the flag subscribe here (or read the field) instead of any ambient
    /// global being written from inside the setter.
    pub fn on_developer_mode_changed(
        &self,
        listener: impl Fn(bool) + 'static,
    ) -> Subscription {
        self.inner
            .emitter
            .subscribe(field::DEBUG_MODE_ENABLED, move |event| {
                if let Some(enabled) = event.value.as_bool() {
                    listener(enabled);
                }
            })
    }

    /// Static field declarations of this type, for the metadata
    /// collaborator.
    pub fn schema() -> &'static [FieldDef] {
        schema::MANAGER_SCHEMA
    }

    /// Declared field names, in schema order.
    pub fn field_names() -> impl Iterator<Item = &'static str> {
        schema::MANAGER_SCHEMA.iter().map(|def| def.name)
    }

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------

    /// Release every subscription and silence both emitters. Idempotent.
    /// The object stays readable and writable afterwards; mutation is
    /// simply no longer observable.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        debug!("disposing settings object");
        self.inner.extender_scope.borrow().dispose();
        self.inner.scope.dispose();
        self.inner.extender.borrow().emitter().close();
        self.inner.emitter.close();
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    // -------------------------------------------------------------------------
    // Persistence seam
    // -------------------------------------------------------------------------

    /// Copy of the current state for the persistence collaborator.
    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            manager: self.inner.fields.borrow().clone(),
            extender: self.inner.extender.borrow().snapshot(),
        }
    }

    /// Apply loaded values through the normal emitting path. Only persisted
    /// fields are written; UI state is untouched. Callers keep the surface
    /// gate closed during load, so none of this dirties.
    pub fn load_from(&self, snapshot: SettingsSnapshot) {
        let SettingsSnapshot { manager, extender } = snapshot;

        self.set_game_data_path(manager.game_data_path);
        self.set_game_executable_path(manager.game_executable_path);
        self.set_game_story_log_enabled(manager.game_story_log_enabled);
        self.set_telemetry_disabled(manager.telemetry_disabled);
        self.set_launch_dx11(manager.launch_dx11);
        self.set_workshop_path(manager.workshop_path);
        self.set_load_order_path(manager.load_order_path);
        self.set_log_enabled(manager.log_enabled);
        self.set_check_for_updates(manager.check_for_updates);
        self.set_auto_add_dependencies(manager.auto_add_dependencies);
        self.set_disable_missing_mod_warnings(manager.disable_missing_mod_warnings);
        self.set_shift_list_focus_on_swap(manager.shift_list_focus_on_swap);
        self.set_disable_workshop_tag_check(manager.disable_workshop_tag_check);
        self.set_last_update_check(manager.last_update_check);
        self.set_last_order(manager.last_order);
        self.set_last_loaded_order_file_path(manager.last_loaded_order_file_path);
        self.set_last_extract_output_path(manager.last_extract_output_path);
        self.set_dark_theme_enabled(manager.dark_theme_enabled);
        self.set_action_on_game_launch(manager.action_on_game_launch);
        self.set_export_default_extender_settings(manager.export_default_extender_settings);
        self.set_debug_mode_enabled(manager.debug_mode_enabled);
        self.set_game_launch_params(manager.game_launch_params);

        self.inner.extender.borrow().load_from(extender);
    }

    // -------------------------------------------------------------------------
    // Typed accessors - persisted fields
    // -------------------------------------------------------------------------

    pub fn game_data_path(&self) -> String {
        self.inner.fields.borrow().game_data_path.clone()
    }

    pub fn set_game_data_path(&self, value: impl Into<String>) -> bool {
        self.set_str(field::GAME_DATA_PATH, value.into(), |f| &mut f.game_data_path)
    }

    pub fn game_executable_path(&self) -> String {
        self.inner.fields.borrow().game_executable_path.clone()
    }

    pub fn set_game_executable_path(&self, value: impl Into<String>) -> bool {
        self.set_str(field::GAME_EXECUTABLE_PATH, value.into(), |f| {
            &mut f.game_executable_path
        })
    }

    pub fn game_story_log_enabled(&self) -> bool {
        self.inner.fields.borrow().game_story_log_enabled
    }

    pub fn set_game_story_log_enabled(&self, value: bool) -> bool {
        self.set_bool(field::GAME_STORY_LOG_ENABLED, value, |f| {
            &mut f.game_story_log_enabled
        })
    }

    pub fn telemetry_disabled(&self) -> bool {
        self.inner.fields.borrow().telemetry_disabled
    }

    pub fn set_telemetry_disabled(&self, value: bool) -> bool {
        self.set_bool(field::TELEMETRY_DISABLED, value, |f| &mut f.telemetry_disabled)
    }

    pub fn launch_dx11(&self) -> bool {
        self.inner.fields.borrow().launch_dx11
    }

    pub fn set_launch_dx11(&self, value: bool) -> bool {
        self.set_bool(field::LAUNCH_DX11, value, |f| &mut f.launch_dx11)
    }

    pub fn workshop_path(&self) -> String {
        self.inner.fields.borrow().workshop_path.clone()
    }

    pub fn set_workshop_path(&self, value: impl Into<String>) -> bool {
        self.set_str(field::WORKSHOP_PATH, value.into(), |f| &mut f.workshop_path)
    }

    pub fn load_order_path(&self) -> String {
        self.inner.fields.borrow().load_order_path.clone()
    }

    pub fn set_load_order_path(&self, value: impl Into<String>) -> bool {
        self.set_str(field::LOAD_ORDER_PATH, value.into(), |f| &mut f.load_order_path)
    }

    pub fn log_enabled(&self) -> bool {
        self.inner.fields.borrow().log_enabled
    }

    pub fn set_log_enabled(&self, value: bool) -> bool {
        self.set_bool(field::LOG_ENABLED, value, |f| &mut f.log_enabled)
    }

    pub fn check_for_updates(&self) -> bool {
        self.inner.fields.borrow().check_for_updates
    }

    pub fn set_check_for_updates(&self, value: bool) -> bool {
        self.set_bool(field::CHECK_FOR_UPDATES, value, |f| &mut f.check_for_updates)
    }

    pub fn auto_add_dependencies(&self) -> bool {
        self.inner.fields.borrow().auto_add_dependencies
    }

    pub fn set_auto_add_dependencies(&self, value: bool) -> bool {
        self.set_bool(field::AUTO_ADD_DEPENDENCIES, value, |f| {
            &mut f.auto_add_dependencies
        })
    }

    pub fn disable_missing_mod_warnings(&self) -> bool {
        self.inner.fields.borrow().disable_missing_mod_warnings
    }

    pub fn set_disable_missing_mod_warnings(&self, value: bool) -> bool {
        self.set_bool(field::DISABLE_MISSING_MOD_WARNINGS, value, |f| {
            &mut f.disable_missing_mod_warnings
        })
    }

    pub fn shift_list_focus_on_swap(&self) -> bool {
        self.inner.fields.borrow().shift_list_focus_on_swap
    }

    pub fn set_shift_list_focus_on_swap(&self, value: bool) -> bool {
        self.set_bool(field::SHIFT_LIST_FOCUS_ON_SWAP, value, |f| {
            &mut f.shift_list_focus_on_swap
        })
    }

    pub fn disable_workshop_tag_check(&self) -> bool {
        self.inner.fields.borrow().disable_workshop_tag_check
    }

    pub fn set_disable_workshop_tag_check(&self, value: bool) -> bool {
        self.set_bool(field::DISABLE_WORKSHOP_TAG_CHECK, value, |f| {
            &mut f.disable_workshop_tag_check
        })
    }

    pub fn last_update_check(&self) -> i64 {
        self.inner.fields.borrow().last_update_check
    }

    pub fn set_last_update_check(&self, value: i64) -> bool {
        self.set_int(field::LAST_UPDATE_CHECK, value, |f| &mut f.last_update_check)
    }

    pub fn last_order(&self) -> String {
        self.inner.fields.borrow().last_order.clone()
    }

    pub fn set_last_order(&self, value: impl Into<String>) -> bool {
        self.set_str(field::LAST_ORDER, value.into(), |f| &mut f.last_order)
    }

    pub fn last_loaded_order_file_path(&self) -> String {
        self.inner.fields.borrow().last_loaded_order_file_path.clone()
    }

    pub fn set_last_loaded_order_file_path(&self, value: impl Into<String>) -> bool {
        self.set_str(field::LAST_LOADED_ORDER_FILE_PATH, value.into(), |f| {
            &mut f.last_loaded_order_file_path
        })
    }

    pub fn last_extract_output_path(&self) -> String {
        self.inner.fields.borrow().last_extract_output_path.clone()
    }

    pub fn set_last_extract_output_path(&self, value: impl Into<String>) -> bool {
        self.set_str(field::LAST_EXTRACT_OUTPUT_PATH, value.into(), |f| {
            &mut f.last_extract_output_path
        })
    }

    pub fn dark_theme_enabled(&self) -> bool {
        self.inner.fields.borrow().dark_theme_enabled
    }

    pub fn set_dark_theme_enabled(&self, value: bool) -> bool {
        self.set_bool(field::DARK_THEME_ENABLED, value, |f| &mut f.dark_theme_enabled)
    }

    pub fn action_on_game_launch(&self) -> LaunchWindowAction {
        self.inner.fields.borrow().action_on_game_launch
    }

    pub fn set_action_on_game_launch(&self, value: LaunchWindowAction) -> bool {
        self.set_action(field::ACTION_ON_GAME_LAUNCH, value, |f| {
            &mut f.action_on_game_launch
        })
    }

    pub fn export_default_extender_settings(&self) -> bool {
        self.inner.fields.borrow().export_default_extender_settings
    }

    pub fn set_export_default_extender_settings(&self, value: bool) -> bool {
        self.set_bool(field::EXPORT_DEFAULT_EXTENDER_SETTINGS, value, |f| {
            &mut f.export_default_extender_settings
        })
    }

    pub fn debug_mode_enabled(&self) -> bool {
        self.inner.fields.borrow().debug_mode_enabled
    }

    pub fn set_debug_mode_enabled(&self, value: bool) -> bool {
        self.set_bool(field::DEBUG_MODE_ENABLED, value, |f| &mut f.debug_mode_enabled)
    }

    pub fn game_launch_params(&self) -> String {
        self.inner.fields.borrow().game_launch_params.clone()
    }

    pub fn set_game_launch_params(&self, value: impl Into<String>) -> bool {
        self.set_str(field::GAME_LAUNCH_PARAMS, value.into(), |f| {
            &mut f.game_launch_params
        })
    }

    // -------------------------------------------------------------------------
    // Typed accessors - transient fields
    // -------------------------------------------------------------------------

    pub fn auto_load_gm_campaign_mods(&self) -> bool {
        self.inner.fields.borrow().auto_load_gm_campaign_mods
    }

    pub fn set_auto_load_gm_campaign_mods(&self, value: bool) -> bool {
        self.set_bool(field::AUTO_LOAD_GM_CAMPAIGN_MODS, value, |f| {
            &mut f.auto_load_gm_campaign_mods
        })
    }

    pub fn display_file_names(&self) -> bool {
        self.inner.fields.borrow().display_file_names
    }

    pub fn set_display_file_names(&self, value: bool) -> bool {
        self.set_bool(field::DISPLAY_FILE_NAMES, value, |f| &mut f.display_file_names)
    }

    pub fn game_master_mode_enabled(&self) -> bool {
        self.inner.fields.borrow().game_master_mode_enabled
    }

    pub fn set_game_master_mode_enabled(&self, value: bool) -> bool {
        self.set_bool(field::GAME_MASTER_MODE_ENABLED, value, |f| {
            &mut f.game_master_mode_enabled
        })
    }

    pub fn selected_tab_index(&self) -> i64 {
        self.inner.fields.borrow().selected_tab_index
    }

    pub fn set_selected_tab_index(&self, value: i64) -> bool {
        self.set_int(field::SELECTED_TAB_INDEX, value, |f| &mut f.selected_tab_index)
    }

    /// Derived: true iff the extender tab is selected.
    pub fn extender_tab_visible(&self) -> bool {
        self.inner.fields.borrow().extender_tab_visible
    }

    /// Derived: true iff the keybindings tab is selected.
    pub fn keybindings_tab_visible(&self) -> bool {
        self.inner.fields.borrow().keybindings_tab_visible
    }

    /// Derived: the nested override when set, otherwise the platform
    /// documents folder plus [`EXTENDER_LOG_FOLDER`].
    pub fn extender_log_directory(&self) -> String {
        self.inner.fields.borrow().extender_log_directory.clone()
    }

    // -------------------------------------------------------------------------
    // By-name access
    // -------------------------------------------------------------------------

    /// Read a field by schema name. Unknown names fail fast.
    pub fn value(&self, name: &str) -> Result<FieldValue, SettingsError> {
        use field as f;
        let fields = self.inner.fields.borrow();
        let value = match name {
            f::GAME_DATA_PATH => fields.game_data_path.clone().into(),
            f::GAME_EXECUTABLE_PATH => fields.game_executable_path.clone().into(),
            f::GAME_STORY_LOG_ENABLED => fields.game_story_log_enabled.into(),
            f::TELEMETRY_DISABLED => fields.telemetry_disabled.into(),
            f::LAUNCH_DX11 => fields.launch_dx11.into(),
            f::WORKSHOP_PATH => fields.workshop_path.clone().into(),
            f::LOAD_ORDER_PATH => fields.load_order_path.clone().into(),
            f::LOG_ENABLED => fields.log_enabled.into(),
            f::CHECK_FOR_UPDATES => fields.check_for_updates.into(),
            f::AUTO_ADD_DEPENDENCIES => fields.auto_add_dependencies.into(),
            f::DISABLE_MISSING_MOD_WARNINGS => fields.disable_missing_mod_warnings.into(),
            f::SHIFT_LIST_FOCUS_ON_SWAP => fields.shift_list_focus_on_swap.into(),
            f::DISABLE_WORKSHOP_TAG_CHECK => fields.disable_workshop_tag_check.into(),
            f::LAST_UPDATE_CHECK => fields.last_update_check.into(),
            f::LAST_ORDER => fields.last_order.clone().into(),
            f::LAST_LOADED_ORDER_FILE_PATH => fields.last_loaded_order_file_path.clone().into(),
            f::LAST_EXTRACT_OUTPUT_PATH => fields.last_extract_output_path.clone().into(),
            f::DARK_THEME_ENABLED => fields.dark_theme_enabled.into(),
            f::ACTION_ON_GAME_LAUNCH => fields.action_on_game_launch.into(),
            f::EXPORT_DEFAULT_EXTENDER_SETTINGS => fields.export_default_extender_settings.into(),
            f::DEBUG_MODE_ENABLED => fields.debug_mode_enabled.into(),
            f::GAME_LAUNCH_PARAMS => fields.game_launch_params.clone().into(),
            f::AUTO_LOAD_GM_CAMPAIGN_MODS => fields.auto_load_gm_campaign_mods.into(),
            f::DISPLAY_FILE_NAMES => fields.display_file_names.into(),
            f::GAME_MASTER_MODE_ENABLED => fields.game_master_mode_enabled.into(),
            f::SELECTED_TAB_INDEX => fields.selected_tab_index.into(),
            f::EXTENDER_TAB_VISIBLE => fields.extender_tab_visible.into(),
            f::KEYBINDINGS_TAB_VISIBLE => fields.keybindings_tab_visible.into(),
            f::EXTENDER_LOG_DIRECTORY => fields.extender_log_directory.clone().into(),
            _ => return Err(SettingsError::UnknownField(name.to_owned())),
        };
        Ok(value)
    }

    /// Write a field by schema name. Returns whether the value changed.
    /// Unknown names, wrong value types and derived targets fail fast.
    pub fn set_value(&self, name: &str, value: FieldValue) -> Result<bool, SettingsError> {
        use field as f;
        match name {
            f::GAME_DATA_PATH => {
                Ok(self.set_game_data_path(expect_str(f::GAME_DATA_PATH, value)?))
            }
            f::GAME_EXECUTABLE_PATH => {
                Ok(self.set_game_executable_path(expect_str(f::GAME_EXECUTABLE_PATH, value)?))
            }
            f::GAME_STORY_LOG_ENABLED => {
                Ok(self.set_game_story_log_enabled(expect_bool(f::GAME_STORY_LOG_ENABLED, value)?))
            }
            f::TELEMETRY_DISABLED => {
                Ok(self.set_telemetry_disabled(expect_bool(f::TELEMETRY_DISABLED, value)?))
            }
            f::LAUNCH_DX11 => Ok(self.set_launch_dx11(expect_bool(f::LAUNCH_DX11, value)?)),
            f::WORKSHOP_PATH => Ok(self.set_workshop_path(expect_str(f::WORKSHOP_PATH, value)?)),
            f::LOAD_ORDER_PATH => {
                Ok(self.set_load_order_path(expect_str(f::LOAD_ORDER_PATH, value)?))
            }
            f::LOG_ENABLED => Ok(self.set_log_enabled(expect_bool(f::LOG_ENABLED, value)?)),
            f::CHECK_FOR_UPDATES => {
                Ok(self.set_check_for_updates(expect_bool(f::CHECK_FOR_UPDATES, value)?))
            }
            f::AUTO_ADD_DEPENDENCIES => {
                Ok(self.set_auto_add_dependencies(expect_bool(f::AUTO_ADD_DEPENDENCIES, value)?))
            }
            f::DISABLE_MISSING_MOD_WARNINGS => Ok(self.set_disable_missing_mod_warnings(
                expect_bool(f::DISABLE_MISSING_MOD_WARNINGS, value)?,
            )),
            f::SHIFT_LIST_FOCUS_ON_SWAP => Ok(
                self.set_shift_list_focus_on_swap(expect_bool(f::SHIFT_LIST_FOCUS_ON_SWAP, value)?)
            ),
            f::DISABLE_WORKSHOP_TAG_CHECK => Ok(self.set_disable_workshop_tag_check(
                expect_bool(f::DISABLE_WORKSHOP_TAG_CHECK, value)?,
            )),
            f::LAST_UPDATE_CHECK => {
                Ok(self.set_last_update_check(expect_int(f::LAST_UPDATE_CHECK, value)?))
            }
            f::LAST_ORDER => Ok(self.set_last_order(expect_str(f::LAST_ORDER, value)?)),
            f::LAST_LOADED_ORDER_FILE_PATH => Ok(self.set_last_loaded_order_file_path(
                expect_str(f::LAST_LOADED_ORDER_FILE_PATH, value)?,
            )),
            f::LAST_EXTRACT_OUTPUT_PATH => Ok(
                self.set_last_extract_output_path(expect_str(f::LAST_EXTRACT_OUTPUT_PATH, value)?)
            ),
            f::DARK_THEME_ENABLED => {
                Ok(self.set_dark_theme_enabled(expect_bool(f::DARK_THEME_ENABLED, value)?))
            }
            f::ACTION_ON_GAME_LAUNCH => match value {
                FieldValue::Action(action) => Ok(self.set_action_on_game_launch(action)),
                other => Err(crate::settings::extender::type_mismatch(
                    f::ACTION_ON_GAME_LAUNCH,
                    "launch action",
                    &other,
                )),
            },
            f::EXPORT_DEFAULT_EXTENDER_SETTINGS => Ok(self.set_export_default_extender_settings(
                expect_bool(f::EXPORT_DEFAULT_EXTENDER_SETTINGS, value)?,
            )),
            f::DEBUG_MODE_ENABLED => {
                Ok(self.set_debug_mode_enabled(expect_bool(f::DEBUG_MODE_ENABLED, value)?))
            }
            f::GAME_LAUNCH_PARAMS => {
                Ok(self.set_game_launch_params(expect_str(f::GAME_LAUNCH_PARAMS, value)?))
            }
            f::AUTO_LOAD_GM_CAMPAIGN_MODS => Ok(self.set_auto_load_gm_campaign_mods(
                expect_bool(f::AUTO_LOAD_GM_CAMPAIGN_MODS, value)?,
            )),
            f::DISPLAY_FILE_NAMES => {
                Ok(self.set_display_file_names(expect_bool(f::DISPLAY_FILE_NAMES, value)?))
            }
            f::GAME_MASTER_MODE_ENABLED => Ok(
                self.set_game_master_mode_enabled(expect_bool(f::GAME_MASTER_MODE_ENABLED, value)?)
            ),
            f::SELECTED_TAB_INDEX => {
                Ok(self.set_selected_tab_index(expect_int(f::SELECTED_TAB_INDEX, value)?))
            }
            f::EXTENDER_TAB_VISIBLE => Err(SettingsError::ReadOnlyField(f::EXTENDER_TAB_VISIBLE)),
            f::KEYBINDINGS_TAB_VISIBLE => {
                Err(SettingsError::ReadOnlyField(f::KEYBINDINGS_TAB_VISIBLE))
            }
            f::EXTENDER_LOG_DIRECTORY => {
                Err(SettingsError::ReadOnlyField(f::EXTENDER_LOG_DIRECTORY))
            }
            _ => Err(SettingsError::UnknownField(name.to_owned())),
        }
    }

    // -------------------------------------------------------------------------
    // Internal setter plumbing
    // -------------------------------------------------------------------------

    fn set_bool(
        &self,
        field: &'static str,
        next: bool,
        slot: fn(&mut ManagerFields) -> &mut bool,
    ) -> bool {
        let previous = {
            let mut fields = self.inner.fields.borrow_mut();
            let slot = slot(&mut fields);
            if *slot == next {
                return false;
            }
            std::mem::replace(slot, next)
        };
        self.emit(field, previous.into(), next.into());
        true
    }

    fn set_int(
        &self,
        field: &'static str,
        next: i64,
        slot: fn(&mut ManagerFields) -> &mut i64,
    ) -> bool {
        let previous = {
            let mut fields = self.inner.fields.borrow_mut();
            let slot = slot(&mut fields);
            if *slot == next {
                return false;
            }
            std::mem::replace(slot, next)
        };
        self.emit(field, previous.into(), next.into());
        true
    }

    fn set_str(
        &self,
        field: &'static str,
        next: String,
        slot: fn(&mut ManagerFields) -> &mut String,
    ) -> bool {
        let previous = {
            let mut fields = self.inner.fields.borrow_mut();
            let slot = slot(&mut fields);
            if *slot == next {
                return false;
            }
            std::mem::replace(slot, next.clone())
        };
        self.emit(field, previous.into(), next.into());
        true
    }

    fn set_action(
        &self,
        field: &'static str,
        next: LaunchWindowAction,
        slot: fn(&mut ManagerFields) -> &mut LaunchWindowAction,
    ) -> bool {
        let previous = {
            let mut fields = self.inner.fields.borrow_mut();
            let slot = slot(&mut fields);
            if *slot == next {
                return false;
            }
            std::mem::replace(slot, next)
        };
        self.emit(field, previous.into(), next.into());
        true
    }

    fn emit(&self, field: &'static str, previous: FieldValue, value: FieldValue) {
        // Field borrow is released before listeners run, so listeners (the
        // dirty tracker, computed recomputes) may read and write fields.
        self.inner.emitter.emit(ChangeEvent {
            field,
            previous,
            value,
        });
    }
}

// =============================================================================
// COMPUTED-FIELD WRITE PATH
// =============================================================================
//
// Recompute closures hold the fields and a weak emitter handle rather than
// the settings object itself, so the listener table never owns the object
// that owns it.

fn recompute_bool(
    fields: &Rc<RefCell<ManagerFields>>,
    emitter: &WeakChangeEmitter,
    field: &'static str,
    slot: fn(&mut ManagerFields) -> &mut bool,
    next: bool,
) {
    let previous = {
        let mut fields = fields.borrow_mut();
        let slot = slot(&mut fields);
        if *slot == next {
            return;
        }
        std::mem::replace(slot, next)
    };
    if let Some(emitter) = emitter.upgrade() {
        emitter.emit(ChangeEvent {
            field,
            previous: previous.into(),
            value: next.into(),
        });
    }
}

fn recompute_str(
    fields: &Rc<RefCell<ManagerFields>>,
    emitter: &WeakChangeEmitter,
    field: &'static str,
    slot: fn(&mut ManagerFields) -> &mut String,
    next: String,
) {
    let previous = {
        let mut fields = fields.borrow_mut();
        let slot = slot(&mut fields);
        if *slot == next {
            return;
        }
        std::mem::replace(slot, next.clone())
    };
    if let Some(emitter) = emitter.upgrade() {
        emitter.emit(ChangeEvent {
            field,
            previous: previous.into(),
            value: next.into(),
        });
    }
}

/// The derived log directory: the override verbatim when set, otherwise the
/// platform documents folder plus the log folder name.
pub fn resolve_log_directory(override_path: &str) -> String {
    if override_path.trim().is_empty() {
        let mut dir = dirs::document_dir().unwrap_or_else(PathBuf::new);
        dir.push(EXTENDER_LOG_FOLDER);
        dir.to_string_lossy().into_owned()
    } else {
        override_path.to_owned()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn open_settings() -> ManagerSettings {
        let settings = ManagerSettings::new();
        settings.set_surface_open(true);
        settings
    }

    #[test]
    fn defaults_match_declarations() {
        let settings = ManagerSettings::new();
        assert_eq!(settings.load_order_path(), "Orders");
        assert!(settings.check_for_updates());
        assert!(settings.auto_add_dependencies());
        assert!(settings.dark_theme_enabled());
        assert_eq!(settings.last_update_check(), -1);
        assert_eq!(settings.action_on_game_launch(), LaunchWindowAction::None);
        assert_eq!(settings.selected_tab_index(), 0);
        assert!(!settings.is_dirty());
        assert!(!settings.surface_open());
    }

    #[test]
    fn persisted_change_dirties_while_surface_open() {
        let settings = open_settings();
        settings.set_game_data_path("C:\\BG3\\Data");
        assert!(settings.is_dirty());
    }

    #[test]
    fn persisted_change_with_surface_closed_does_not_dirty() {
        let settings = ManagerSettings::new();
        settings.set_game_data_path("C:\\BG3\\Data");

        // The value applied; only the dirty signaling was gated.
        assert_eq!(settings.game_data_path(), "C:\\BG3\\Data");
        assert!(!settings.is_dirty());
    }

    #[test]
    fn transient_change_never_dirties() {
        let settings = open_settings();
        settings.set_display_file_names(true);
        settings.set_game_master_mode_enabled(true);
        settings.set_selected_tab_index(2);
        assert!(!settings.is_dirty());
    }

    #[test]
    fn equal_value_does_not_dirty() {
        let settings = open_settings();
        settings.set_load_order_path("Orders"); // already the default
        assert!(!settings.is_dirty());
    }

    #[test]
    fn clear_dirty_resets_without_mutation() {
        let settings = open_settings();
        settings.set_log_enabled(true);
        assert!(settings.is_dirty());

        settings.clear_dirty();
        assert!(!settings.is_dirty());
        assert!(settings.log_enabled());
    }

    #[test]
    fn tab_bindings_flip_synchronously() {
        let settings = ManagerSettings::new();

        settings.set_selected_tab_index(TAB_EXTENDER);
        assert!(settings.extender_tab_visible());
        assert!(!settings.keybindings_tab_visible());

        settings.set_selected_tab_index(TAB_KEYBINDINGS);
        assert!(!settings.extender_tab_visible());
        assert!(settings.keybindings_tab_visible());

        settings.set_selected_tab_index(0);
        assert!(!settings.extender_tab_visible());
        assert!(!settings.keybindings_tab_visible());
    }

    #[test]
    fn log_directory_falls_back_to_documents() {
        let settings = ManagerSettings::new();
        let derived = settings.extender_log_directory();
        assert!(derived.ends_with(EXTENDER_LOG_FOLDER), "got {derived}");
    }

    #[test]
    fn log_directory_tracks_the_override() {
        let settings = ManagerSettings::new();

        settings.extender().set_log_directory("C:\\Custom");
        assert_eq!(settings.extender_log_directory(), "C:\\Custom");

        // Clearing the override restores the fallback, no explicit
        // recompute call needed.
        settings.extender().set_log_directory("");
        assert!(settings.extender_log_directory().ends_with(EXTENDER_LOG_FOLDER));
    }

    #[test]
    fn nested_persisted_change_dirties_the_root() {
        let settings = open_settings();
        settings.extender().set_enable_logging(true);
        assert!(settings.is_dirty());
    }

    #[test]
    fn nested_transient_change_does_not_dirty() {
        let settings = open_settings();
        settings.extender().set_detected_version(61);
        assert!(!settings.is_dirty());
    }

    #[test]
    fn nested_change_with_surface_closed_does_not_dirty() {
        let settings = ManagerSettings::new();
        settings.extender().set_enable_logging(true);
        assert!(!settings.is_dirty());
    }

    #[test]
    fn by_name_access_round_trips() {
        let settings = ManagerSettings::new();
        settings
            .set_value(field::WORKSHOP_PATH, FieldValue::from("C:\\Workshop"))
            .unwrap();
        assert_eq!(
            settings.value(field::WORKSHOP_PATH).unwrap(),
            FieldValue::from("C:\\Workshop")
        );

        settings
            .set_value(
                field::ACTION_ON_GAME_LAUNCH,
                FieldValue::Action(LaunchWindowAction::Minimize),
            )
            .unwrap();
        assert_eq!(
            settings.action_on_game_launch(),
            LaunchWindowAction::Minimize
        );
    }

    #[test]
    fn unknown_field_fails_fast() {
        let settings = ManagerSettings::new();
        assert_eq!(
            settings.value("Bogus"),
            Err(SettingsError::UnknownField("Bogus".into()))
        );
        assert_eq!(
            settings.set_value("Bogus", FieldValue::Bool(true)),
            Err(SettingsError::UnknownField("Bogus".into()))
        );
    }

    #[test]
    fn derived_fields_reject_by_name_writes() {
        let settings = ManagerSettings::new();
        for name in [
            field::EXTENDER_TAB_VISIBLE,
            field::KEYBINDINGS_TAB_VISIBLE,
            field::EXTENDER_LOG_DIRECTORY,
        ] {
            let err = settings.set_value(name, FieldValue::Bool(true)).unwrap_err();
            assert_eq!(err, SettingsError::ReadOnlyField(name));
        }
    }

    #[test]
    fn wrong_value_type_fails_fast_and_leaves_value() {
        let settings = ManagerSettings::new();
        let err = settings
            .set_value(field::LAST_UPDATE_CHECK, FieldValue::Bool(true))
            .unwrap_err();
        assert!(matches!(err, SettingsError::TypeMismatch { expected: "int", .. }));
        assert_eq!(settings.last_update_check(), -1);
    }

    #[test]
    fn developer_mode_event_fires_on_change() {
        let settings = ManagerSettings::new();
        let seen = Rc::new(Cell::new(None));

        let probe = seen.clone();
        let _sub = settings.on_developer_mode_changed(move |enabled| probe.set(Some(enabled)));

        settings.set_debug_mode_enabled(true);
        assert_eq!(seen.get(), Some(true));

        settings.set_debug_mode_enabled(false);
        assert_eq!(seen.get(), Some(false));
    }

    #[test]
    fn observe_field_validates_the_name() {
        let settings = ManagerSettings::new();
        assert!(settings.observe_field("Bogus", |_| {}).is_err());

        let hits = Rc::new(Cell::new(0));
        let probe = hits.clone();
        let _sub = settings
            .observe_field(field::DARK_THEME_ENABLED, move |_| probe.set(probe.get() + 1))
            .unwrap();

        settings.set_dark_theme_enabled(false);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn reset_extender_releases_the_old_instance() {
        let settings = open_settings();
        let old = settings.extender();
        old.set_enable_logging(true);
        settings.clear_dirty();

        settings.reset_extender_settings();
        // The reset itself is a persisted change.
        assert!(settings.is_dirty());
        settings.clear_dirty();

        // Old handle is silenced; it can no longer feed the flag.
        old.set_debugger_port(1234);
        assert!(!settings.is_dirty());

        // The fresh instance has defaults and is fully observed.
        let fresh = settings.extender();
        assert!(!fresh.enable_logging());
        fresh.set_enable_logging(true);
        assert!(settings.is_dirty());
    }

    #[test]
    fn reset_extender_recomputes_the_derived_path() {
        let settings = ManagerSettings::new();
        settings.extender().set_log_directory("C:\\Custom");
        assert_eq!(settings.extender_log_directory(), "C:\\Custom");

        settings.reset_extender_settings();
        assert!(settings.extender_log_directory().ends_with(EXTENDER_LOG_FOLDER));

        // And the new instance's override is tracked.
        settings.extender().set_log_directory("D:\\Other");
        assert_eq!(settings.extender_log_directory(), "D:\\Other");
    }

    #[test]
    fn reset_while_surface_closed_does_not_dirty() {
        let settings = ManagerSettings::new();
        settings.reset_extender_settings();
        assert!(!settings.is_dirty());
    }

    #[test]
    fn field_names_cover_the_schema() {
        let names: Vec<_> = ManagerSettings::field_names().collect();
        assert_eq!(names.len(), ManagerSettings::schema().len());
        assert!(names.contains(&field::GAME_DATA_PATH));
    }
}
