//! Closures and their continuation state.
//!
//! A closure is a code block bound to a captured variable level, owned by
//! whichever scalar currently references it, with a non-owning back
//! reference to its owning script instance. Invoking one acquires the
//! owner's sharing-group lock, pushes the closure level and a local level,
//! binds `$0` to the caller's message and `$1..$n` to the positional
//! arguments, and evaluates the body.
//!
//! Yield suspends logically: evaluation returns up the native call stack
//! carrying a continuation - the (block, resume-index) contexts accumulated
//! during unwind plus the live local level. The next invocation restores
//! that local level and resumes each saved block at its saved sibling-step
//! index, never from the block's start.

use std::any::Any;
use std::sync::Weak;

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;

use siesta_ir::{BlockRef, FlowKind};
use siesta_value::{HostObject, ObjectRef, Scalar};

use crate::context::ScriptContext;
use crate::errors::{EvalError, EvalResult};
use crate::frame::Frame;
use crate::instance::{InstanceShared, ScriptInstance};
use crate::registry::Function;
use crate::variables::{new_level, LevelRef, Variable};

/// Saved state letting a yielded closure resume correctly.
#[derive(Debug)]
struct Continuation {
    /// Resume points, innermost first.
    contexts: Vec<(BlockRef, usize)>,
    /// The local level live at the yield point.
    locals: LevelRef,
}

/// A code block bound to a variable scope, invocable as a function and
/// possibly resumable.
pub struct Closure {
    id: u32,
    owner: Weak<InstanceShared>,
    block: BlockRef,
    scope: LevelRef,
    state: Mutex<Option<Continuation>>,
    metadata: RwLock<FxHashMap<String, Scalar>>,
}

impl Closure {
    /// Capture `block` for `owner`, with a fresh internal variable level.
    pub fn new(owner: &ScriptInstance, block: BlockRef) -> Closure {
        Closure::with_scope(owner, block, new_level())
    }

    /// Capture `block` for `owner` with an explicit scope level, as
    /// named-function binding does to thread a parent scope through.
    pub fn with_scope(owner: &ScriptInstance, block: BlockRef, scope: LevelRef) -> Closure {
        Closure {
            id: owner.registry().next_closure_id(),
            owner: owner.downgrade(),
            block,
            scope,
            state: Mutex::new(None),
            metadata: RwLock::new(FxHashMap::default()),
        }
    }

    /// Runtime-unique display id.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// The closure's code.
    pub fn block(&self) -> &BlockRef {
        &self.block
    }

    /// The closure's bound variable level.
    pub fn scope(&self) -> LevelRef {
        self.scope.clone()
    }

    /// The owning instance, while it is still alive.
    pub fn owner(&self) -> Option<ScriptInstance> {
        self.owner.upgrade().map(ScriptInstance::from_shared)
    }

    /// Whether a saved continuation is waiting to resume.
    pub fn is_resumable(&self) -> bool {
        self.state.lock().is_some()
    }

    /// Per-closure metadata, read side.
    pub fn metadata_get(&self, key: &str) -> Option<Scalar> {
        self.metadata.read().get(key).cloned()
    }

    /// Per-closure metadata, write side.
    pub fn metadata_put(&self, key: impl Into<String>, value: Scalar) {
        self.metadata.write().insert(key.into(), value);
    }

    /// Invoke or resume the closure.
    pub fn invoke(
        &self,
        message: &str,
        ctx: &mut ScriptContext<'_>,
        args: &mut Frame,
    ) -> EvalResult {
        let owner = self.owner().ok_or_else(|| EvalError::Unloaded {
            name: "<collected>".to_owned(),
        })?;
        if !owner.is_loaded() {
            return Err(EvalError::Unloaded {
                name: owner.name().to_owned(),
            });
        }

        let vars = owner.variables();
        // Calls touching the same variable chain must not interleave across
        // threads; the guard spans scope-push, body, and scope-pop.
        let guard = vars.guard();
        let _held = guard.lock();

        let saved = self.state.lock().take();
        let (locals, saved_contexts) = match saved {
            Some(continuation) => (continuation.locals, continuation.contexts),
            None => (new_level(), Vec::new()),
        };
        {
            let mut level = locals.write();
            level.put("$0", Scalar::string(message));
            let mut position = 0usize;
            for arg in args.drain_all() {
                position += 1;
                level.put(&format!("${position}"), arg);
            }
        }

        vars.push_closure(self.scope.clone());
        vars.push_local(locals.clone());

        let mut body_ctx = ctx.with_owner(&owner);
        let outcome = run_body(&mut body_ctx, &self.block, saved_contexts);
        drop(body_ctx);

        vars.pop_local();
        vars.pop_closure();

        let remaining = match outcome {
            Ok(remaining) => remaining,
            Err(error) => {
                // Fatal unwind: discard any half-built continuation state.
                ctx.env.take_contexts();
                ctx.env.clear_flow();
                return Err(error);
            }
        };

        match ctx.env.take_flow() {
            Some(flow) if flow.kind == FlowKind::Return => {
                ctx.env.take_contexts();
                Ok(flow.value)
            }
            Some(flow) if flow.kind == FlowKind::Yield => {
                let mut contexts = ctx.env.take_contexts();
                contexts.extend(remaining);
                *self.state.lock() = Some(Continuation { contexts, locals });
                Ok(flow.value)
            }
            Some(flow) => {
                let line = self.block.line_range().map_or(0, |(low, _)| low);
                ctx.advise(line, format!("misplaced {} outside of a loop", flow.kind));
                Ok(Scalar::empty())
            }
            None => Ok(Scalar::empty()),
        }
    }
}

/// Evaluate the closure body, either from the top or by replaying saved
/// resume points. Returns the not-yet-resumed outer contexts when a new
/// suspension cuts the replay short.
fn run_body(
    ctx: &mut ScriptContext<'_>,
    block: &BlockRef,
    saved: Vec<(BlockRef, usize)>,
) -> Result<Vec<(BlockRef, usize)>, EvalError> {
    if saved.is_empty() {
        ctx.eval_block(block)?;
        return Ok(Vec::new());
    }
    let mut contexts = saved.into_iter();
    while let Some((resume_block, resume_at)) = contexts.next() {
        ctx.eval_block_from(&resume_block, resume_at)?;
        if ctx.env.flow_kind().is_some() {
            return Ok(contexts.collect());
        }
    }
    Ok(Vec::new())
}

impl std::fmt::Debug for Closure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Closure")
            .field("id", &self.id)
            .field("resumable", &self.is_resumable())
            .finish_non_exhaustive()
    }
}

impl HostObject for Closure {
    fn type_name(&self) -> &'static str {
        "Closure"
    }

    fn describe(&self) -> String {
        format!("&closure[{}]", self.id)
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}

/// Adapter registering a closure as a named function.
///
/// Binders use this to install script-declared subroutines in the registry;
/// the declared name arrives as the `$0` message when called.
pub struct ClosureFunction {
    closure: ObjectRef,
}

impl ClosureFunction {
    /// Wrap a closure payload.
    pub fn new(closure: ObjectRef) -> ClosureFunction {
        ClosureFunction { closure }
    }

    /// Wrap the closure held by a scalar, when there is one.
    pub fn from_scalar(scalar: &Scalar) -> Option<ClosureFunction> {
        let object = scalar.object_value()?;
        object.downcast_ref::<Closure>()?;
        Some(ClosureFunction::new(object))
    }
}

impl Function for ClosureFunction {
    fn evaluate(&self, name: &str, ctx: &mut ScriptContext<'_>, args: &mut Frame) -> EvalResult {
        match self.closure.downcast_ref::<Closure>() {
            Some(closure) => closure.invoke(name, ctx, args),
            None => Err(EvalError::NotAClosure {
                found: siesta_value::ScalarType::Object,
            }),
        }
    }
}
