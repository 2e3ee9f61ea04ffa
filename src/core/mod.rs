// ============================================================================
// tracked-settings - Core Module
// Shared types, constants and the static field schema
// ============================================================================

pub mod constants;
pub mod schema;
pub mod types;
