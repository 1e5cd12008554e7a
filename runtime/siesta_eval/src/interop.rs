//! Host-object interop: the static-binding FFI.
//!
//! Instead of reflective member resolution, host bridges register a
//! [`HostClass`] per object type. The class answers a three-valued match
//! question per (member, arity) pair - yes, maybe, or no - and the engine
//! dispatches on yes-or-maybe, warning on no. A "maybe" is how variadic or
//! loosely-typed members participate without claiming every access.
//!
//! The behavioral contract is graceful degradation: a mismatch or a failure
//! inside a bridge member becomes a non-fatal warning, never a crash of the
//! running script.

use siesta_value::ObjectRef;

use crate::context::ScriptContext;
use crate::errors::{missing_member, EvalResult};
use crate::frame::Frame;

/// Three-valued member match.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum Match {
    /// Exact member/arity match.
    Yes,
    /// Member exists and might accept this arity (variadic, defaulted).
    Maybe,
    /// No such member at this arity.
    No,
}

impl Match {
    /// Whether dispatch should proceed.
    pub fn accepts(self) -> bool {
        !matches!(self, Match::No)
    }
}

/// Host-class bridge for object construction and member dispatch.
///
/// Registered in the environment registry under the class name, which must
/// equal the [`siesta_value::HostObject::type_name`] of the instances it
/// handles.
pub trait HostClass: Send + Sync {
    /// Construct an instance from the argument frame.
    fn construct(&self, ctx: &mut ScriptContext<'_>, args: &mut Frame) -> EvalResult {
        let _ = (ctx, args.len());
        Err(missing_member(self.class_name(), "<init>", args.len()))
    }

    /// The registered class name.
    fn class_name(&self) -> &'static str;

    /// Score a member access before dispatch.
    fn match_member(&self, member: &str, argc: usize) -> Match;

    /// Dispatch an instance member.
    fn call_member(
        &self,
        object: &ObjectRef,
        member: &str,
        ctx: &mut ScriptContext<'_>,
        args: &mut Frame,
    ) -> EvalResult;

    /// Dispatch a static member.
    fn call_static(&self, member: &str, ctx: &mut ScriptContext<'_>, args: &mut Frame) -> EvalResult {
        let _ = ctx;
        Err(missing_member(self.class_name(), member, args.len()))
    }
}
