// ============================================================================
// tracked-settings - Type Definitions
// Field kinds, field values, change events and the error taxonomy
// ============================================================================

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// FIELD KIND
// =============================================================================

/// Whether a field participates in persistence and dirty tracking.
///
/// The kind is fixed by the static schema declaration; it never changes at
/// runtime. Fields missing from a schema are treated as [`Transient`]
/// (unknown fields never force a dirty flag or a save).
///
/// [`Transient`]: FieldKind::Transient
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Saved to disk; changes set the owning object's dirty flag.
    Persisted,
    /// UI-only state; changes are observable but never dirty anything.
    Transient,
}

// =============================================================================
// LAUNCH WINDOW ACTION
// =============================================================================

/// What the manager window does when the game is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LaunchWindowAction {
    #[default]
    None,
    Minimize,
    Hide,
    Close,
}

// =============================================================================
// FIELD VALUE
// =============================================================================

/// A dynamically-typed field value, used by the by-name access surface and
/// carried in [`ChangeEvent`]s.
///
/// Nested settings objects are not field values; they are reached through a
/// dedicated accessor on the owning object.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Str(String),
    Bool(bool),
    Int(i64),
    Action(LaunchWindowAction),
}

impl FieldValue {
    /// Name of the variant, used in type-mismatch errors.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Str(_) => "string",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Action(_) => "launch action",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            FieldValue::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_action(&self) -> Option<LaunchWindowAction> {
        match self {
            FieldValue::Action(a) => Some(*a),
            _ => None,
        }
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_owned())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Int(value)
    }
}

impl From<LaunchWindowAction> for FieldValue {
    fn from(value: LaunchWindowAction) -> Self {
        FieldValue::Action(value)
    }
}

// =============================================================================
// CHANGE EVENT
// =============================================================================

/// A single field mutation, delivered synchronously to listeners.
///
/// Events are ephemeral: they are borrowed by listeners during the emit and
/// never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent {
    /// Schema name of the field that changed.
    pub field: &'static str,
    /// Value before the mutation.
    pub previous: FieldValue,
    /// Value after the mutation.
    pub value: FieldValue,
}

// =============================================================================
// ERRORS
// =============================================================================

/// Contract violations surfaced by the settings core.
///
/// Everything here is a local programming error, not a recoverable runtime
/// condition: callers get the error synchronously and nothing is retried or
/// logged-and-ignored.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettingsError {
    /// By-name access to a field outside the static declaration.
    #[error("unknown settings field `{0}`")]
    UnknownField(String),

    /// By-name write with a value of the wrong type.
    #[error("field `{field}` expects a {expected} value, got {got}")]
    TypeMismatch {
        field: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    /// By-name write to a derived field. Computed targets are only ever
    /// written by their own recompute.
    #[error("field `{0}` is derived and read-only")]
    ReadOnlyField(&'static str),

    /// A computed binding whose dependency graph would contain a cycle.
    /// Rejected before any subscription is made, so no partial state is
    /// left behind.
    #[error("computed binding for `{field}` would form a derivation cycle")]
    CyclicDerivation { field: &'static str },
}

// =============================================================================
// TESTS
// =============================================================================
