//! Siesta Diagnostic - warnings and error reporting for the Siesta runtime.
//!
//! This crate provides:
//! - [`ScriptWarning`]: the non-fatal fault report delivered to watchers
//! - [`WarningWatcher`]: the observer interface embedders register
//! - [`DebugFlags`]: the per-instance debug bitmask
//! - [`SyntaxError`] / [`CompileError`]: the structured fatal parse errors
//!   raised by the compile/eval entry points
//!
//! Runtime faults never abort a script: the engine converts them into
//! warnings at the nearest enclosing block and keeps going. Compile faults
//! are the opposite - a script that fails to parse never starts running and
//! the caller receives the full structured error list.

mod flags;
mod syntax;
mod warning;

pub use flags::DebugFlags;
pub use syntax::{CompileError, SyntaxError};
pub use warning::{ScriptWarning, WarningWatcher};
