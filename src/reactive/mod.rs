// ============================================================================
// tracked-settings - Reactive Module
// Change emitter, disposal scope, dirty tracker and computed-field binder
// ============================================================================

pub mod computed;
pub mod dirty;
pub mod emitter;
pub mod scope;
