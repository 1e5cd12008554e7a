//! Control-flow steps: check chains, branches, and loops.

use siesta_ir::{BlockRef, Check, FlowKind};
use siesta_value::Scalar;

use crate::context::ScriptContext;
use crate::errors::{missing_predicate, EvalError, EvalResult};

use super::contain_panic;

/// What a loop should do after inspecting pending flow control.
enum LoopFlow {
    /// No request, or a consumed continue: keep looping.
    Run,
    /// A consumed break: exit the loop, flow cleared.
    Exit,
    /// Return or yield: exit and leave the request pending.
    Propagate,
}

impl ScriptContext<'_> {
    /// Evaluate a check chain to its short-circuited decision.
    fn eval_check(&mut self, check: &Check) -> Result<bool, EvalError> {
        self.env.frames().create_frame();
        if let Err(error) = self.eval_args(check.setup()) {
            self.env.frames().kill_frame();
            return Err(error);
        }
        if self.env.flow_kind().is_some() {
            self.env.frames().kill_frame();
            return Ok(false);
        }
        let mut frame = self.env.frames().take_frame();
        let Some(predicate) = self.registry().find_predicate(check.name()) else {
            return Err(missing_predicate(check.name()));
        };
        self.note_dispatch(check.name(), check.line(), frame.values());
        let mut decided =
            contain_panic(|| predicate.decide(check.name(), self, &mut frame))?;
        if check.is_negated() {
            decided = !decided;
        }
        // AND continues only on true, OR only on false.
        if decided {
            if let Some(next) = check.and_branch() {
                return self.eval_check(next);
            }
        } else if let Some(next) = check.or_branch() {
            return self.eval_check(next);
        }
        Ok(decided)
    }

    /// A check whose faults degrade to a warning and a false decision.
    fn check_or_false(&mut self, check: &Check) -> Result<bool, EvalError> {
        match self.eval_check(check) {
            Ok(decided) => Ok(decided),
            Err(error) if error.is_fatal() => Err(error),
            Err(error) => {
                self.warn_fault(check.line(), &error);
                Ok(false)
            }
        }
    }

    /// Consume or propagate flow control at a loop's iteration boundary.
    fn loop_flow(&mut self, frame_depth: usize) -> LoopFlow {
        match self.env.flow_kind() {
            None => LoopFlow::Run,
            Some(FlowKind::Break) => {
                // Break clears the request and drops any partially built
                // operand state from the aborted iteration.
                self.env.clear_flow();
                self.env.frames().unwind_to(frame_depth);
                LoopFlow::Exit
            }
            Some(FlowKind::Continue) => {
                self.env.clear_flow();
                LoopFlow::Run
            }
            Some(FlowKind::Return | FlowKind::Yield) => LoopFlow::Propagate,
        }
    }

    pub(super) fn eval_decide(
        &mut self,
        check: &Check,
        if_true: &BlockRef,
        if_false: Option<&BlockRef>,
    ) -> EvalResult {
        let decided = self.check_or_false(check)?;
        if self.env.flow_kind().is_some() {
            return Ok(Scalar::empty());
        }
        if decided {
            self.eval_block(if_true)
        } else if let Some(branch) = if_false {
            self.eval_block(branch)
        } else {
            Ok(Scalar::empty())
        }
    }

    /// The condition-checked loop shared by `while` and `for`: check, run
    /// the body, run the per-iteration increment, re-check. Loops also
    /// cooperate with unload: they re-test the instance's loaded flag at
    /// every iteration boundary.
    pub(super) fn eval_goto(
        &mut self,
        check: &Check,
        body: &BlockRef,
        increment: Option<&BlockRef>,
    ) -> EvalResult {
        let frame_depth = self.env.frames().depth();
        while self.instance.is_loaded() {
            if !self.check_or_false(check)? {
                break;
            }
            if self.env.flow_kind().is_some() {
                // A suspension inside the condition leaves the loop; it
                // must not be swallowed here.
                break;
            }
            self.eval_block(body)?;
            match self.loop_flow(frame_depth) {
                LoopFlow::Run => {}
                LoopFlow::Exit | LoopFlow::Propagate => break,
            }
            if let Some(step) = increment {
                self.eval_block(step)?;
                match self.loop_flow(frame_depth) {
                    LoopFlow::Run => {}
                    LoopFlow::Exit | LoopFlow::Propagate => break,
                }
            }
        }
        Ok(Scalar::empty())
    }

    /// Iterate an array's elements or a hash's live keys, binding the
    /// value handle (and optionally the key) each iteration.
    pub(super) fn eval_foreach(
        &mut self,
        source: &BlockRef,
        key: Option<&str>,
        value: &str,
        body: &BlockRef,
    ) -> EvalResult {
        let container = self.eval_block(source)?;
        if self.env.flow_kind().is_some() {
            return Ok(Scalar::empty());
        }
        let frame_depth = self.env.frames().depth();
        let vars = self.variables();

        if let Some(array) = container.array_value() {
            let items = array.read().snapshot();
            for (position, item) in items.into_iter().enumerate() {
                if !self.instance.is_loaded() {
                    break;
                }
                if let Some(key_name) = key {
                    // Arrays synthesize a numeric index as the key.
                    vars.put_active(key_name, Scalar::long(position as i64));
                }
                vars.put_active(value, item);
                self.eval_block(body)?;
                match self.loop_flow(frame_depth) {
                    LoopFlow::Run => {}
                    LoopFlow::Exit | LoopFlow::Propagate => break,
                }
            }
        } else if let Some(hash) = container.hash_value() {
            let keys = hash.write().keys();
            for entry_key in keys {
                if !self.instance.is_loaded() {
                    break;
                }
                let entry = hash.write().get(&entry_key);
                if let Some(key_name) = key {
                    vars.put_active(key_name, Scalar::string(entry_key));
                }
                vars.put_active(value, entry);
                self.eval_block(body)?;
                match self.loop_flow(frame_depth) {
                    LoopFlow::Run => {}
                    LoopFlow::Exit | LoopFlow::Propagate => break,
                }
            }
        } else if !container.is_empty() {
            return Err(EvalError::NotIterable {
                found: container.scalar_type(),
            });
        }
        Ok(Scalar::empty())
    }
}
