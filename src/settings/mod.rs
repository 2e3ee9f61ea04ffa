// ============================================================================
// tracked-settings - Settings Module
// The application settings objects built on the reactive layer
// ============================================================================

pub mod extender;
pub mod manager;
