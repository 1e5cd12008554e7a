//! Siesta Eval - the execution engine for the Siesta scripting runtime.
//!
//! This crate walks the step tree from `siesta_ir` against a mutable
//! variable/function environment, producing `siesta_value` scalars.
//!
//! # Architecture
//!
//! - [`ScriptInstance`]: ties a compiled block, a registry, and a variable
//!   chain together; entry points are `run`, `fork`, and `call_closure`
//! - [`ScriptContext`]: the per-dispatch context bridges receive
//! - [`ScriptEnvironment`]: frames, pending flow control, flagged errors
//! - [`ScriptVariables`]: the local -> closure -> global precedence chain
//! - [`Closure`]: blocks bound to scopes, with yield/resume continuations
//! - [`SharedRegistry`]: names to [`Function`]/[`Operator`]/[`Predicate`]/
//!   binder/host-class implementations
//!
//! # Fault policy
//!
//! Recoverable faults degrade to warnings at the enclosing block and the
//! script keeps running; fatal errors unwind to the caller; engine
//! invariant violations (frame or scope discipline) panic outright.
//!
//! # Re-exports
//!
//! Value types re-export from `siesta_value` and diagnostics from
//! `siesta_diagnostic` for embedder convenience.

mod closure;
mod context;
mod environment;
pub mod errors;
mod frame;
mod instance;
mod interop;
pub mod ops;
mod registry;
mod stack;
mod variables;

mod exec;

pub use closure::{Closure, ClosureFunction};
pub use context::ScriptContext;
pub use environment::{FlowRequest, ScriptEnvironment};
pub use errors::{EvalError, EvalResult};
pub use frame::{Frame, FrameStack};
pub use instance::ScriptInstance;
pub use interop::{HostClass, Match};
pub use registry::{Binder, FilterBinder, Function, Operator, Predicate, SharedRegistry};
pub use stack::ensure_sufficient_stack;
pub use variables::{new_level, LevelRef, ScriptVariables, Variable, VariableLevel};

// Re-export the value model and diagnostics for convenience.
pub use siesta_diagnostic::{CompileError, DebugFlags, ScriptWarning, SyntaxError, WarningWatcher};
pub use siesta_value::{
    ArrayRef, ContainerError, HashRef, HostObject, KeyValuePair, MapHash, ObjectRef, ReadOnlyArray,
    Scalar, ScalarArray, ScalarHash, ScalarType, VecArray, ViewArray,
};

#[cfg(test)]
mod tests;
