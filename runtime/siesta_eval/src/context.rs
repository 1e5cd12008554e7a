//! The evaluation context handed to steps and bridges.
//!
//! A [`ScriptContext`] pairs the instance whose code is currently executing
//! with mutable access to the caller's script environment. Bridges receive
//! it in every dispatch, giving them warning delivery, the flagged-error
//! side channel, the registry, and closure invocation - everything a
//! cooperative extension needs without any global state.

use std::sync::Arc;

use siesta_diagnostic::{DebugFlags, ScriptWarning};
use siesta_value::Scalar;

use crate::closure::Closure;
use crate::environment::ScriptEnvironment;
use crate::errors::{EvalError, EvalResult};
use crate::frame::Frame;
use crate::instance::ScriptInstance;
use crate::registry::SharedRegistry;
use crate::variables::ScriptVariables;

/// Evaluation context: the executing instance plus the live environment.
pub struct ScriptContext<'a> {
    pub(crate) instance: ScriptInstance,
    pub(crate) env: &'a mut ScriptEnvironment,
}

impl<'a> ScriptContext<'a> {
    pub(crate) fn new(instance: ScriptInstance, env: &'a mut ScriptEnvironment) -> ScriptContext<'a> {
        ScriptContext { instance, env }
    }

    /// The instance whose code is executing.
    pub fn instance(&self) -> &ScriptInstance {
        &self.instance
    }

    /// The environment registry.
    pub fn registry(&self) -> SharedRegistry {
        self.instance.registry()
    }

    /// The executing instance's variable chain.
    pub fn variables(&self) -> Arc<ScriptVariables> {
        self.instance.variables()
    }

    /// A context for code owned by another instance, sharing this one's
    /// environment. Closure bodies evaluate against their owner.
    pub(crate) fn with_owner<'b>(&'b mut self, owner: &ScriptInstance) -> ScriptContext<'b> {
        ScriptContext {
            instance: owner.clone(),
            env: &mut *self.env,
        }
    }

    /// Flag a cooperative error for a later [`ScriptContext::check_error`].
    pub fn flag_error(&mut self, message: impl Into<String>) {
        self.env.flag_error(message);
    }

    /// Read and clear the flagged error.
    pub fn check_error(&mut self) -> Option<String> {
        self.env.check_error()
    }

    /// Report a runtime fault as a warning. Delivery is gated on the
    /// instance's `SHOW_ERRORS` flag.
    pub fn warn(&mut self, line: u32, message: impl std::fmt::Display) {
        let message = message.to_string();
        tracing::debug!(script = self.instance.name(), line, %message, "script warning");
        if self.instance.debug_flags().contains(DebugFlags::SHOW_ERRORS) {
            self.instance
                .deliver(&ScriptWarning::new(self.instance.name(), message, line));
        }
    }

    /// Report an advisory (non-fault) warning, gated on `SHOW_WARNINGS`.
    pub fn advise(&mut self, line: u32, message: impl std::fmt::Display) {
        let message = message.to_string();
        if self.instance.debug_flags().contains(DebugFlags::SHOW_WARNINGS) {
            self.instance
                .deliver(&ScriptWarning::new(self.instance.name(), message, line));
        }
    }

    pub(crate) fn warn_fault(&mut self, line: u32, error: &EvalError) {
        self.warn(line, error);
    }

    /// Record a dispatch for tracing and profiling.
    pub(crate) fn note_dispatch(&mut self, name: &str, line: u32, args: &[Scalar]) {
        let flags = self.instance.debug_flags();
        if !flags.intersects(DebugFlags::TRACE_CALLS | DebugFlags::PROFILE_ONLY) {
            return;
        }
        self.env.profile_hit(name);
        if flags.contains(DebugFlags::TRACE_CALLS) && !flags.contains(DebugFlags::PROFILE_ONLY) {
            let rendered: Vec<String> = args.iter().map(ToString::to_string).collect();
            let message = format!("{name}({})", rendered.join(", "));
            tracing::trace!(script = self.instance.name(), line, %message, "dispatch");
            self.instance
                .deliver(&ScriptWarning::trace(self.instance.name(), message, line));
        }
    }

    /// Report a failed runtime compilation (an `eval`-style facility
    /// compiling source on the fly). The structured errors land on the
    /// flagged-error channel and as a warning; the host process never
    /// aborts for a script-supplied source fault.
    pub fn flag_compile_error(&mut self, line: u32, error: &siesta_diagnostic::CompileError) {
        self.env.flag_error(error.render());
        self.warn(line, error);
    }

    /// Invoke a closure-holding scalar. The primary callback path for
    /// bridges delivering results into script code.
    pub fn invoke_closure(&mut self, closure: &Scalar, message: &str, args: Frame) -> EvalResult {
        let object = closure.object_value().ok_or(EvalError::NotAClosure {
            found: closure.scalar_type(),
        })?;
        let mut args = args;
        match object.downcast_ref::<Closure>() {
            Some(c) => c.invoke(message, self, &mut args),
            None => Err(EvalError::NotAClosure {
                found: closure.scalar_type(),
            }),
        }
    }
}
