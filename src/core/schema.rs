// ============================================================================
// tracked-settings - Field Schema
// Static field declarations and the persisted-field registry
// ============================================================================
//
// The settings objects have a fixed, statically-known set of named fields.
// Instead of discovering persisted fields through runtime introspection,
// each settings type declares an explicit (name, kind) table here. The
// registry filters those tables once per type; the dirty tracker consumes
// the result as its subscription list.
// ============================================================================

use std::sync::OnceLock;

use super::types::FieldKind;

// =============================================================================
// FIELD DEFINITION
// =============================================================================

/// One declared field: its schema name and whether it is persisted.
#[derive(Debug, Clone, Copy)]
pub struct FieldDef {
    pub name: &'static str,
    pub kind: FieldKind,
}

const fn persisted(name: &'static str) -> FieldDef {
    FieldDef {
        name,
        kind: FieldKind::Persisted,
    }
}

const fn transient(name: &'static str) -> FieldDef {
    FieldDef {
        name,
        kind: FieldKind::Transient,
    }
}

// =============================================================================
// MANAGER FIELD NAMES
// =============================================================================

/// Schema names of the root settings object's fields. These match the
/// serialized member names of the settings file.
pub mod field {
    pub const GAME_DATA_PATH: &str = "GameDataPath";
    pub const GAME_EXECUTABLE_PATH: &str = "GameExecutablePath";
    pub const GAME_STORY_LOG_ENABLED: &str = "GameStoryLogEnabled";
    pub const TELEMETRY_DISABLED: &str = "TelemetryDisabled";
    pub const LAUNCH_DX11: &str = "LaunchDX11";
    pub const WORKSHOP_PATH: &str = "WorkshopPath";
    pub const LOAD_ORDER_PATH: &str = "LoadOrderPath";
    pub const LOG_ENABLED: &str = "LogEnabled";
    pub const CHECK_FOR_UPDATES: &str = "CheckForUpdates";
    pub const AUTO_ADD_DEPENDENCIES: &str = "AutoAddDependenciesWhenExporting";
    pub const DISABLE_MISSING_MOD_WARNINGS: &str = "DisableMissingModWarnings";
    pub const SHIFT_LIST_FOCUS_ON_SWAP: &str = "ShiftListFocusOnSwap";
    pub const DISABLE_WORKSHOP_TAG_CHECK: &str = "DisableWorkshopTagCheck";
    pub const LAST_UPDATE_CHECK: &str = "LastUpdateCheck";
    pub const LAST_ORDER: &str = "LastOrder";
    pub const LAST_LOADED_ORDER_FILE_PATH: &str = "LastLoadedOrderFilePath";
    pub const LAST_EXTRACT_OUTPUT_PATH: &str = "LastExtractOutputPath";
    pub const DARK_THEME_ENABLED: &str = "DarkThemeEnabled";
    pub const ACTION_ON_GAME_LAUNCH: &str = "ActionOnGameLaunch";
    pub const EXPORT_DEFAULT_EXTENDER_SETTINGS: &str = "ExportDefaultExtenderSettings";
    pub const DEBUG_MODE_ENABLED: &str = "DebugModeEnabled";
    pub const GAME_LAUNCH_PARAMS: &str = "GameLaunchParams";

    pub const AUTO_LOAD_GM_CAMPAIGN_MODS: &str = "AutomaticallyLoadGMCampaignMods";
    pub const DISPLAY_FILE_NAMES: &str = "DisplayFileNames";
    pub const GAME_MASTER_MODE_ENABLED: &str = "GameMasterModeEnabled";
    pub const SELECTED_TAB_INDEX: &str = "SelectedTabIndex";
    pub const EXTENDER_TAB_VISIBLE: &str = "ExtenderTabVisible";
    pub const KEYBINDINGS_TAB_VISIBLE: &str = "KeybindingsTabVisible";
    pub const EXTENDER_LOG_DIRECTORY: &str = "ExtenderLogDirectory";
}

/// Schema names of the nested script-extender settings object's fields.
pub mod extender_field {
    pub const ENABLE_EXTENSIONS: &str = "EnableExtensions";
    pub const LOG_DIRECTORY: &str = "LogDirectory";
    pub const ENABLE_LOGGING: &str = "EnableLogging";
    pub const LOG_COMPILE: &str = "LogCompile";
    pub const SEND_CRASH_REPORTS: &str = "SendCrashReports";
    pub const DEVELOPER_MODE: &str = "DeveloperMode";
    pub const ENABLE_DEBUGGER: &str = "EnableDebugger";
    pub const DEBUGGER_PORT: &str = "DebuggerPort";
    pub const DETECTED_VERSION: &str = "DetectedVersion";
}

// =============================================================================
// SCHEMAS
// =============================================================================

/// Field table of the root settings object. Order here is the order the
/// dirty tracker subscribes in.
pub const MANAGER_SCHEMA: &[FieldDef] = &[
    persisted(field::GAME_DATA_PATH),
    persisted(field::GAME_EXECUTABLE_PATH),
    persisted(field::GAME_STORY_LOG_ENABLED),
    persisted(field::TELEMETRY_DISABLED),
    persisted(field::LAUNCH_DX11),
    persisted(field::WORKSHOP_PATH),
    persisted(field::LOAD_ORDER_PATH),
    persisted(field::LOG_ENABLED),
    persisted(field::CHECK_FOR_UPDATES),
    persisted(field::AUTO_ADD_DEPENDENCIES),
    persisted(field::DISABLE_MISSING_MOD_WARNINGS),
    persisted(field::SHIFT_LIST_FOCUS_ON_SWAP),
    persisted(field::DISABLE_WORKSHOP_TAG_CHECK),
    persisted(field::LAST_UPDATE_CHECK),
    persisted(field::LAST_ORDER),
    persisted(field::LAST_LOADED_ORDER_FILE_PATH),
    persisted(field::LAST_EXTRACT_OUTPUT_PATH),
    persisted(field::DARK_THEME_ENABLED),
    persisted(field::ACTION_ON_GAME_LAUNCH),
    persisted(field::EXPORT_DEFAULT_EXTENDER_SETTINGS),
    persisted(field::DEBUG_MODE_ENABLED),
    persisted(field::GAME_LAUNCH_PARAMS),
    transient(field::AUTO_LOAD_GM_CAMPAIGN_MODS),
    transient(field::DISPLAY_FILE_NAMES),
    transient(field::GAME_MASTER_MODE_ENABLED),
    transient(field::SELECTED_TAB_INDEX),
    transient(field::EXTENDER_TAB_VISIBLE),
    transient(field::KEYBINDINGS_TAB_VISIBLE),
    transient(field::EXTENDER_LOG_DIRECTORY),
];

/// Field table of the nested script-extender settings object.
pub const EXTENDER_SCHEMA: &[FieldDef] = &[
    persisted(extender_field::ENABLE_EXTENSIONS),
    persisted(extender_field::LOG_DIRECTORY),
    persisted(extender_field::ENABLE_LOGGING),
    persisted(extender_field::LOG_COMPILE),
    persisted(extender_field::SEND_CRASH_REPORTS),
    persisted(extender_field::DEVELOPER_MODE),
    persisted(extender_field::ENABLE_DEBUGGER),
    persisted(extender_field::DEBUGGER_PORT),
    transient(extender_field::DETECTED_VERSION),
];

// =============================================================================
// REGISTRY
// =============================================================================

fn persisted_names(schema: &[FieldDef]) -> Vec<&'static str> {
    schema
        .iter()
        .filter(|def| def.kind == FieldKind::Persisted)
        .map(|def| def.name)
        .collect()
}

/// Persisted field names of the root settings object, in declaration order.
/// Computed once per type, not per instance.
pub fn manager_persisted_fields() -> &'static [&'static str] {
    static FIELDS: OnceLock<Vec<&'static str>> = OnceLock::new();
    FIELDS.get_or_init(|| persisted_names(MANAGER_SCHEMA))
}

/// Persisted field names of the nested extender settings, in declaration
/// order. Computed once per type, not per instance.
pub fn extender_persisted_fields() -> &'static [&'static str] {
    static FIELDS: OnceLock<Vec<&'static str>> = OnceLock::new();
    FIELDS.get_or_init(|| persisted_names(EXTENDER_SCHEMA))
}

/// Kind of a named field. Names absent from the schema report
/// [`FieldKind::Transient`]: an undeclared field must never force a dirty
/// flag or a save.
pub fn kind_of(schema: &[FieldDef], name: &str) -> FieldKind {
    schema
        .iter()
        .find(|def| def.name == name)
        .map(|def| def.kind)
        .unwrap_or(FieldKind::Transient)
}

/// Whether `name` appears in `schema` at all.
pub fn declares(schema: &[FieldDef], name: &str) -> bool {
    schema.iter().any(|def| def.name == name)
}

// =============================================================================
// TESTS
// =============================================================================
