//! Step evaluation: the block protocol and dispatch steps.
//!
//! # Evaluation protocol
//!
//! A block evaluates its steps in order. Each step returns the value it
//! produced (the empty scalar for side-effect-only steps) and may set a
//! pending flow-control request on the environment. Any non-fatal error a
//! step raises is caught here, at the enclosing block: it becomes a warning
//! carrying the step's line number, the step's result is the empty scalar,
//! and evaluation continues at the next sibling step. One bad statement
//! does not abort the script.
//!
//! When a pending request is a yield, the block records `(block, index+1)`
//! before unwinding, so a later re-entry resumes at the sibling after the
//! yielding step rather than at the block's start.
//!
//! # Frame protocol
//!
//! Steps with argument lists create a frame, evaluate their argument block
//! (each argument step's result is pushed in declaration order), detach the
//! frame for the callee to drain, and the frame returns to the pool when
//! dispatch completes. Create/take stay balanced on every path.

mod control;

use std::panic::{catch_unwind, AssertUnwindSafe};

use siesta_ir::{BlockRef, Literal, Sigil, Step, StepKind};
use siesta_value::{ContainerError, Scalar};

use crate::closure::Closure;
use crate::context::ScriptContext;
use crate::errors::{
    missing_binder, missing_class, missing_function, missing_member, missing_operator, EvalError,
    EvalResult,
};
use crate::frame::Frame;
use crate::stack::ensure_sufficient_stack;

impl ScriptContext<'_> {
    /// Evaluate a block from its first step.
    pub(crate) fn eval_block(&mut self, block: &BlockRef) -> EvalResult {
        self.eval_block_from(block, 0)
    }

    /// Evaluate a block starting at `start`, the resume entry point.
    pub(crate) fn eval_block_from(&mut self, block: &BlockRef, start: usize) -> EvalResult {
        ensure_sufficient_stack(|| {
            let mut produced = Scalar::empty();
            let mut index = start;
            while index < block.len() {
                let step = &block.steps()[index];
                match self.eval_step(step) {
                    Ok(value) => produced = value,
                    Err(error) if error.is_fatal() => return Err(error),
                    Err(error) => {
                        self.warn_fault(step.line(), &error);
                        produced = Scalar::empty();
                    }
                }
                if let Some(kind) = self.env.flow_kind() {
                    if kind == siesta_ir::FlowKind::Yield {
                        self.env.push_context(block.clone(), index + 1);
                    }
                    break;
                }
                index += 1;
            }
            Ok(produced)
        })
    }

    /// Evaluate an argument block into the current frame: one pushed value
    /// per step, in declaration order.
    fn eval_args(&mut self, block: &BlockRef) -> Result<(), EvalError> {
        for step in block.steps() {
            match self.eval_step(step) {
                Ok(value) => self.env.frames().current().push(value),
                Err(error) if error.is_fatal() => return Err(error),
                Err(error) => {
                    self.warn_fault(step.line(), &error);
                    self.env.frames().current().push(Scalar::empty());
                }
            }
            if self.env.flow_kind().is_some() {
                break;
            }
        }
        Ok(())
    }

    /// Build an argument frame from a block, detached for dispatch.
    /// Returns `None` when flow control interrupted the argument list.
    fn collect_args(&mut self, block: &BlockRef) -> Result<Option<Frame>, EvalError> {
        self.env.frames().create_frame();
        if let Err(error) = self.eval_args(block) {
            self.env.frames().kill_frame();
            return Err(error);
        }
        if self.env.flow_kind().is_some() {
            self.env.frames().kill_frame();
            return Ok(None);
        }
        Ok(Some(self.env.frames().take_frame()))
    }

    fn eval_step(&mut self, step: &Step) -> EvalResult {
        let line = step.line();
        match step.kind() {
            StepKind::PushLiteral { value } => Ok(literal_scalar(value)),
            StepKind::Get { name } => Ok(self.eval_get(name, line)),
            StepKind::Index {
                source,
                name,
                index,
            } => self.eval_index(source, name, index),
            StepKind::Assign { lhs, rhs } => self.eval_assign(lhs, rhs),
            StepKind::AssignTuple { targets, rhs } => self.eval_assign_tuple(targets, rhs),
            StepKind::Call { name, args } => self.eval_call(name, args, line),
            StepKind::Operate { symbol, operands } => self.eval_operate(symbol, operands, line),
            StepKind::Decide {
                check,
                if_true,
                if_false,
            } => self.eval_decide(check, if_true, if_false.as_ref()),
            StepKind::Goto {
                check,
                body,
                increment,
            } => self.eval_goto(check, body, increment.as_ref()),
            StepKind::Foreach {
                source,
                key,
                value,
                body,
            } => self.eval_foreach(source, key.as_deref(), value, body),
            StepKind::Flow { kind, value } => {
                let carried = match value {
                    Some(block) => self.eval_block(block)?,
                    None => Scalar::empty(),
                };
                self.env.set_flow(*kind, carried);
                Ok(Scalar::empty())
            }
            StepKind::CreateClosure { body } => Ok(Scalar::object(Closure::new(
                &self.instance,
                body.clone(),
            ))),
            StepKind::Bind {
                keyword,
                name,
                body,
            } => {
                let binder = self
                    .registry()
                    .find_binder(keyword)
                    .ok_or_else(|| missing_binder(keyword))?;
                binder.bind_function(self, keyword, name, body)?;
                Ok(Scalar::empty())
            }
            StepKind::BindFilter {
                keyword,
                name,
                filter,
                body,
            } => {
                let parameter = self.eval_block(filter)?;
                let binder = self
                    .registry()
                    .find_filter_binder(keyword)
                    .ok_or_else(|| missing_binder(keyword))?;
                binder.bind_filtered_function(self, keyword, name, &parameter, body)?;
                Ok(Scalar::empty())
            }
            StepKind::ObjectNew { class, args } => self.eval_object_new(class, args, line),
            StepKind::ObjectAccess {
                target,
                member,
                args,
            } => self.eval_object_access(target, member, args.as_ref(), line),
            StepKind::ObjectAccessStatic {
                class,
                member,
                args,
            } => self.eval_object_static(class, member, args, line),
        }
    }

    /// Variable read. Reading an undeclared name declares it: an empty
    /// value shaped by the name's sigil is bound at the global fallback
    /// level before being returned.
    fn eval_get(&mut self, name: &str, line: u32) -> Scalar {
        let vars = self.variables();
        if let Some(value) = vars.lookup(name) {
            return value;
        }
        if self
            .instance
            .debug_flags()
            .contains(siesta_diagnostic::DebugFlags::STRICT_DECLARATIONS)
        {
            self.advise(line, format!("variable {name} read before declaration"));
        }
        let fresh = match Sigil::of(name) {
            Sigil::Array => Scalar::new_array(),
            Sigil::Hash => Scalar::new_hash(),
            Sigil::Scalar => Scalar::empty(),
        };
        vars.put_global(name, fresh.clone());
        fresh
    }

    /// Container-element resolution, auto-vivifying the container by the
    /// variable name's sigil and the element by read.
    fn eval_index(&mut self, source: &BlockRef, name: &str, index: &BlockRef) -> EvalResult {
        let container = self.eval_block(source)?;
        if self.env.flow_kind().is_some() {
            return Ok(Scalar::empty());
        }
        let index = self.eval_block(index)?;
        if self.env.flow_kind().is_some() {
            return Ok(Scalar::empty());
        }
        match Sigil::of(name) {
            Sigil::Hash => {
                let hash = container.vivify_hash()?;
                let key = index.string_value();
                let result = hash.write().get(&key);
                Ok(result)
            }
            // A `$` name indexing positionally behaves as an array view.
            Sigil::Array | Sigil::Scalar => {
                let array = container.vivify_array()?;
                let raw = index.long_value();
                let len = array.read().len();
                let resolved = resolve_index(raw, len)?;
                let result = array.write().get(resolved)?;
                Ok(result)
            }
        }
    }

    fn eval_assign(&mut self, lhs: &BlockRef, rhs: &BlockRef) -> EvalResult {
        let value = self.eval_block(rhs)?;
        if self.env.flow_kind().is_some() {
            return Ok(Scalar::empty());
        }
        let target = self.eval_block(lhs)?;
        if self.env.flow_kind().is_some() {
            return Ok(Scalar::empty());
        }
        target.set_from(&value);
        // Returning the settable handle enables chained assignment.
        Ok(target)
    }

    /// Destructuring: positional spread for arrays, broadcast for anything
    /// else.
    fn eval_assign_tuple(&mut self, targets: &[BlockRef], rhs: &BlockRef) -> EvalResult {
        let value = self.eval_block(rhs)?;
        if self.env.flow_kind().is_some() {
            return Ok(Scalar::empty());
        }
        if let Some(array) = value.array_value() {
            let elements = array.read().snapshot();
            for (position, target_block) in targets.iter().enumerate() {
                let target = self.eval_block(target_block)?;
                match elements.get(position) {
                    Some(element) => target.set_from(element),
                    None => target.set_from(&Scalar::empty()),
                }
            }
        } else {
            for target_block in targets {
                let target = self.eval_block(target_block)?;
                target.set_from(&value);
            }
        }
        Ok(value)
    }

    fn eval_call(&mut self, name: &str, args: &BlockRef, line: u32) -> EvalResult {
        let Some(mut frame) = self.collect_args(args)? else {
            return Ok(Scalar::empty());
        };
        let Some(function) = self.registry().find_function(name) else {
            return Err(missing_function(name));
        };
        self.note_dispatch(name, line, frame.values());
        contain_panic(|| function.evaluate(name, self, &mut frame))
    }

    fn eval_operate(&mut self, symbol: &str, operands: &BlockRef, line: u32) -> EvalResult {
        let Some(mut frame) = self.collect_args(operands)? else {
            return Ok(Scalar::empty());
        };
        let Some(operator) = self.registry().find_operator(symbol) else {
            return Err(missing_operator(symbol));
        };
        self.note_dispatch(symbol, line, frame.values());
        contain_panic(|| operator.operate(symbol, self, &mut frame))
    }

    fn eval_object_new(&mut self, class: &str, args: &BlockRef, line: u32) -> EvalResult {
        let Some(mut frame) = self.collect_args(args)? else {
            return Ok(Scalar::empty());
        };
        let Some(bridge) = self.registry().find_class(class) else {
            return Err(missing_class(class));
        };
        self.note_dispatch(class, line, frame.values());
        contain_panic(|| bridge.construct(self, &mut frame))
    }

    fn eval_object_access(
        &mut self,
        target: &BlockRef,
        member: &str,
        args: Option<&BlockRef>,
        line: u32,
    ) -> EvalResult {
        let object_scalar = self.eval_block(target)?;
        if self.env.flow_kind().is_some() {
            return Ok(Scalar::empty());
        }
        let object = object_scalar
            .object_value()
            .ok_or(EvalError::NotAnObject {
                found: object_scalar.scalar_type(),
            })?;
        let mut frame = match args {
            Some(block) => match self.collect_args(block)? {
                Some(frame) => frame,
                None => return Ok(Scalar::empty()),
            },
            None => Frame::new(),
        };
        let class_name = object.type_name();
        let Some(bridge) = self.registry().find_class(class_name) else {
            return Err(missing_class(class_name));
        };
        if !bridge.match_member(member, frame.len()).accepts() {
            return Err(missing_member(class_name, member, frame.len()));
        }
        self.note_dispatch(member, line, frame.values());
        contain_panic(|| bridge.call_member(&object, member, self, &mut frame))
    }

    fn eval_object_static(
        &mut self,
        class: &str,
        member: &str,
        args: &BlockRef,
        line: u32,
    ) -> EvalResult {
        let Some(mut frame) = self.collect_args(args)? else {
            return Ok(Scalar::empty());
        };
        let Some(bridge) = self.registry().find_class(class) else {
            return Err(missing_class(class));
        };
        if !bridge.match_member(member, frame.len()).accepts() {
            return Err(missing_member(class, member, frame.len()));
        }
        self.note_dispatch(member, line, frame.values());
        contain_panic(|| bridge.call_static(member, self, &mut frame))
    }
}

fn literal_scalar(literal: &Literal) -> Scalar {
    match literal {
        Literal::Int(n) => Scalar::int(*n),
        Literal::Long(n) => Scalar::long(*n),
        Literal::Double(d) => Scalar::double(*d),
        Literal::Str(s) => Scalar::string(s.clone()),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn resolve_index(raw: i64, len: usize) -> Result<usize, ContainerError> {
    let resolved = if raw < 0 { len as i64 + raw } else { raw };
    usize::try_from(resolved).map_err(|_| ContainerError::OutOfRange {
        index: raw.unsigned_abs() as usize,
        len,
    })
}

/// Contain a bridge panic at the dispatch boundary: the script must survive
/// a misbehaving bridge.
fn contain_panic<T>(call: impl FnOnce() -> Result<T, EvalError>) -> Result<T, EvalError> {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(result) => result,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| (*s).to_owned())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "<non-string panic payload>".to_owned());
            Err(EvalError::BridgePanic { message })
        }
    }
}
