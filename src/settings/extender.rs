// ============================================================================
// tracked-settings - Script Extender Settings
// Nested settings block owned by the root manager settings
// ============================================================================
//
// The extender block is a full settings object in its own right: static
// schema, typed and by-name access, equality-gated change emission through
// its own emitter. It has no dirty flag of its own - the parent's tracker
// observes this emitter and is the single authority for save-needed state.
// ============================================================================

use std::cell::RefCell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::core::schema::{self, extender_field, FieldDef};
use crate::core::types::{ChangeEvent, FieldValue, SettingsError};
use crate::reactive::emitter::ChangeEmitter;

// =============================================================================
// FIELD STORAGE
// =============================================================================

/// Plain data snapshot of the extender settings. This is the shape the
/// persistence collaborator serializes; transient fields are skipped and
/// missing fields fall back to defaults on load.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtenderFields {
    #[serde(rename = "EnableExtensions")]
    pub enable_extensions: bool,
    #[serde(rename = "LogDirectory")]
    pub log_directory: String,
    #[serde(rename = "EnableLogging")]
    pub enable_logging: bool,
    #[serde(rename = "LogCompile")]
    pub log_compile: bool,
    #[serde(rename = "SendCrashReports")]
    pub send_crash_reports: bool,
    #[serde(rename = "DeveloperMode")]
    pub developer_mode: bool,
    #[serde(rename = "EnableDebugger")]
    pub enable_debugger: bool,
    #[serde(rename = "DebuggerPort")]
    pub debugger_port: i64,
    /// Extender version probed at runtime; UI only.
    #[serde(skip)]
    pub detected_version: i64,
}

impl Default for ExtenderFields {
    fn default() -> Self {
        Self {
            enable_extensions: true,
            log_directory: String::new(),
            enable_logging: false,
            log_compile: false,
            send_crash_reports: true,
            developer_mode: false,
            enable_debugger: false,
            debugger_port: 9999,
            detected_version: -1,
        }
    }
}

// =============================================================================
// SCRIPT EXTENDER SETTINGS (Public handle)
// =============================================================================

/// Nested script-extender settings object. Cloning the handle shares the
/// same instance; the parent keeps the identity stable for the session
/// except through its controlled reset path.
#[derive(Clone)]
pub struct ScriptExtenderSettings {
    fields: Rc<RefCell<ExtenderFields>>,
    emitter: ChangeEmitter,
}

impl Default for ScriptExtenderSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptExtenderSettings {
    /// Construct with defaults.
    pub fn new() -> Self {
        Self::from_fields(ExtenderFields::default())
    }

    /// Construct from loaded field values.
    pub fn from_fields(fields: ExtenderFields) -> Self {
        Self {
            fields: Rc::new(RefCell::new(fields)),
            emitter: ChangeEmitter::new(),
        }
    }

    /// The change emitter the parent's dirty tracker observes.
    pub fn emitter(&self) -> &ChangeEmitter {
        &self.emitter
    }

    /// Static field declarations of this type.
    pub fn schema() -> &'static [FieldDef] {
        schema::EXTENDER_SCHEMA
    }

    // -------------------------------------------------------------------------
    // Typed accessors
    // -------------------------------------------------------------------------

    pub fn enable_extensions(&self) -> bool {
        self.fields.borrow().enable_extensions
    }

    pub fn set_enable_extensions(&self, value: bool) -> bool {
        self.set_bool(extender_field::ENABLE_EXTENSIONS, value, |f| {
            &mut f.enable_extensions
        })
    }

    pub fn log_directory(&self) -> String {
        self.fields.borrow().log_directory.clone()
    }

    pub fn set_log_directory(&self, value: impl Into<String>) -> bool {
        self.set_str(extender_field::LOG_DIRECTORY, value.into(), |f| {
            &mut f.log_directory
        })
    }

    pub fn enable_logging(&self) -> bool {
        self.fields.borrow().enable_logging
    }

    pub fn set_enable_logging(&self, value: bool) -> bool {
        self.set_bool(extender_field::ENABLE_LOGGING, value, |f| {
            &mut f.enable_logging
        })
    }

    pub fn log_compile(&self) -> bool {
        self.fields.borrow().log_compile
    }

    pub fn set_log_compile(&self, value: bool) -> bool {
        self.set_bool(extender_field::LOG_COMPILE, value, |f| &mut f.log_compile)
    }

    pub fn send_crash_reports(&self) -> bool {
        self.fields.borrow().send_crash_reports
    }

    pub fn set_send_crash_reports(&self, value: bool) -> bool {
        self.set_bool(extender_field::SEND_CRASH_REPORTS, value, |f| {
            &mut f.send_crash_reports
        })
    }

    pub fn developer_mode(&self) -> bool {
        self.fields.borrow().developer_mode
    }

    pub fn set_developer_mode(&self, value: bool) -> bool {
        self.set_bool(extender_field::DEVELOPER_MODE, value, |f| {
            &mut f.developer_mode
        })
    }

    pub fn enable_debugger(&self) -> bool {
        self.fields.borrow().enable_debugger
    }

    pub fn set_enable_debugger(&self, value: bool) -> bool {
        self.set_bool(extender_field::ENABLE_DEBUGGER, value, |f| {
            &mut f.enable_debugger
        })
    }

    pub fn debugger_port(&self) -> i64 {
        self.fields.borrow().debugger_port
    }

    pub fn set_debugger_port(&self, value: i64) -> bool {
        self.set_int(extender_field::DEBUGGER_PORT, value, |f| {
            &mut f.debugger_port
        })
    }

    pub fn detected_version(&self) -> i64 {
        self.fields.borrow().detected_version
    }

    pub fn set_detected_version(&self, value: i64) -> bool {
        self.set_int(extender_field::DETECTED_VERSION, value, |f| {
            &mut f.detected_version
        })
    }

    // -------------------------------------------------------------------------
    // By-name access
    // -------------------------------------------------------------------------

    /// Read a field by schema name. Unknown names fail fast.
    pub fn value(&self, name: &str) -> Result<FieldValue, SettingsError> {
        let fields = self.fields.borrow();
        let value = match name {
            extender_field::ENABLE_EXTENSIONS => fields.enable_extensions.into(),
            extender_field::LOG_DIRECTORY => fields.log_directory.clone().into(),
            extender_field::ENABLE_LOGGING => fields.enable_logging.into(),
            extender_field::LOG_COMPILE => fields.log_compile.into(),
            extender_field::SEND_CRASH_REPORTS => fields.send_crash_reports.into(),
            extender_field::DEVELOPER_MODE => fields.developer_mode.into(),
            extender_field::ENABLE_DEBUGGER => fields.enable_debugger.into(),
            extender_field::DEBUGGER_PORT => fields.debugger_port.into(),
            extender_field::DETECTED_VERSION => fields.detected_version.into(),
            _ => return Err(SettingsError::UnknownField(name.to_owned())),
        };
        Ok(value)
    }

    /// Write a field by schema name. Returns whether the value changed.
    /// Unknown names and wrong value types fail fast.
    pub fn set_value(&self, name: &str, value: FieldValue) -> Result<bool, SettingsError> {
        use extender_field as f;
        match name {
            f::ENABLE_EXTENSIONS => {
                Ok(self.set_enable_extensions(expect_bool(f::ENABLE_EXTENSIONS, value)?))
            }
            f::LOG_DIRECTORY => Ok(self.set_log_directory(expect_str(f::LOG_DIRECTORY, value)?)),
            f::ENABLE_LOGGING => {
                Ok(self.set_enable_logging(expect_bool(f::ENABLE_LOGGING, value)?))
            }
            f::LOG_COMPILE => Ok(self.set_log_compile(expect_bool(f::LOG_COMPILE, value)?)),
            f::SEND_CRASH_REPORTS => {
                Ok(self.set_send_crash_reports(expect_bool(f::SEND_CRASH_REPORTS, value)?))
            }
            f::DEVELOPER_MODE => {
                Ok(self.set_developer_mode(expect_bool(f::DEVELOPER_MODE, value)?))
            }
            f::ENABLE_DEBUGGER => {
                Ok(self.set_enable_debugger(expect_bool(f::ENABLE_DEBUGGER, value)?))
            }
            f::DEBUGGER_PORT => Ok(self.set_debugger_port(expect_int(f::DEBUGGER_PORT, value)?)),
            f::DETECTED_VERSION => {
                Ok(self.set_detected_version(expect_int(f::DETECTED_VERSION, value)?))
            }
            _ => Err(SettingsError::UnknownField(name.to_owned())),
        }
    }

    // -------------------------------------------------------------------------
    // Persistence seam
    // -------------------------------------------------------------------------

    /// Copy of the current field values.
    pub fn snapshot(&self) -> ExtenderFields {
        self.fields.borrow().clone()
    }

    /// Apply loaded values through the normal emitting path. The parent
    /// keeps its gate closed during load, so this never dirties.
    pub fn load_from(&self, fields: ExtenderFields) {
        self.set_enable_extensions(fields.enable_extensions);
        self.set_log_directory(fields.log_directory);
        self.set_enable_logging(fields.enable_logging);
        self.set_log_compile(fields.log_compile);
        self.set_send_crash_reports(fields.send_crash_reports);
        self.set_developer_mode(fields.developer_mode);
        self.set_enable_debugger(fields.enable_debugger);
        self.set_debugger_port(fields.debugger_port);
    }

    // -------------------------------------------------------------------------
    // Internal setter plumbing
    // -------------------------------------------------------------------------

    fn set_bool(
        &self,
        field: &'static str,
        next: bool,
        slot: fn(&mut ExtenderFields) -> &mut bool,
    ) -> bool {
        let previous = {
            let mut fields = self.fields.borrow_mut();
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
        slot: fn(&mut ExtenderFields) -> &mut i64,
    ) -> bool {
        let previous = {
            let mut fields = self.fields.borrow_mut();
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
        slot: fn(&mut ExtenderFields) -> &mut String,
    ) -> bool {
        let previous = {
            let mut fields = self.fields.borrow_mut();
            let slot = slot(&mut fields);
            if *slot == next {
                return false;
            }
            std::mem::replace(slot, next.clone())
        };
        self.emit(field, previous.into(), next.into());
        true
    }

    fn emit(&self, field: &'static str, previous: FieldValue, value: FieldValue) {
        // The field borrow is released before listeners run.
        self.emitter.emit(ChangeEvent {
            field,
            previous,
            value,
        });
    }
}

pub(crate) fn expect_bool(field: &'static str, value: FieldValue) -> Result<bool, SettingsError> {
    value
        .as_bool()
        .ok_or_else(|| type_mismatch(field, "bool", &value))
}

pub(crate) fn expect_int(field: &'static str, value: FieldValue) -> Result<i64, SettingsError> {
    value
        .as_int()
        .ok_or_else(|| type_mismatch(field, "int", &value))
}

pub(crate) fn expect_str(field: &'static str, value: FieldValue) -> Result<String, SettingsError> {
    match value {
        FieldValue::Str(s) => Ok(s),
        other => Err(type_mismatch(field, "string", &other)),
    }
}

pub(crate) fn type_mismatch(
    field: &'static str,
    expected: &'static str,
    got: &FieldValue,
) -> SettingsError {
    SettingsError::TypeMismatch {
        field,
        expected,
        got: got.type_name(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
