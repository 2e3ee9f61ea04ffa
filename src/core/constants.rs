// ============================================================================
// tracked-settings - Constants
// Fixed values shared by the reactive core and the settings model
// ============================================================================

// =============================================================================
// NOTIFY DEPTH
// =============================================================================

/// Maximum depth of re-entrant change notification.
///
/// Computed fields recompute synchronously inside the emit of their source
/// field, so a cyclic derivation would recurse without bound. Bindings are
/// rejected at bind time when they would form a cycle; this limit is the
/// runtime backstop that turns an escaped cycle into a loud failure instead
/// of a stack overflow.
pub const MAX_NOTIFY_DEPTH: u32 = 32;

// =============================================================================
// SETTINGS PANEL TABS
// =============================================================================

/// Tab index of the script extender panel.
pub const TAB_EXTENDER: i64 = 1;

/// Tab index of the keybindings panel.
pub const TAB_KEYBINDINGS: i64 = 2;

// =============================================================================
// DERIVED PATH DEFAULTS
// =============================================================================

/// Folder under the user's documents directory used for extender logs when
/// no override is configured.
pub const EXTENDER_LOG_FOLDER: &str = "OsirisLogs";

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tab_indices_are_distinct() {
        assert_ne!(TAB_EXTENDER, TAB_KEYBINDINGS);
    }

    #[test]
    fn notify_depth_allows_chained_recomputes() {
        // A root change that dirties a computed field which dirties another
        // still needs headroom well below the guard.
        assert!(MAX_NOTIFY_DEPTH >= 8);
    }
}
