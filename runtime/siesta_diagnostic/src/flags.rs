//! Per-instance debug flags.

use bitflags::bitflags;

bitflags! {
    /// Debug bitmask recognized by a script instance.
    #[derive(Copy, Clone, Eq, PartialEq, Debug)]
    pub struct DebugFlags: u8 {
        /// Deliver runtime-fault warnings to watchers.
        const SHOW_ERRORS = 1 << 0;
        /// Deliver non-fault warnings to watchers.
        const SHOW_WARNINGS = 1 << 1;
        /// Warn when a variable is read before any declaration.
        const STRICT_DECLARATIONS = 1 << 2;
        /// Narrate every function/operator/predicate dispatch.
        const TRACE_CALLS = 1 << 3;
        /// Collect dispatch counts without emitting trace narration.
        const PROFILE_ONLY = 1 << 4;
    }
}

impl Default for DebugFlags {
    /// Errors and warnings are delivered unless the embedder opts out.
    fn default() -> DebugFlags {
        DebugFlags::SHOW_ERRORS | DebugFlags::SHOW_WARNINGS
    }
}
