//! Block construction API for the external parser.
//!
//! The parser appends one step per lowered operation and calls
//! [`BlockBuilder::finish`] at the end of each lexical unit. Sub-expressions
//! (operands, arguments, loop bodies) are themselves blocks built the same
//! way and passed in as `BlockRef`s.
//!
//! Argument and operand blocks follow the frame protocol: each step's result
//! is pushed onto a fresh frame in declaration order, so pop order is
//! rightmost-declared first.

use crate::block::{Block, BlockRef};
use crate::step::{Check, FlowKind, Literal, Step, StepKind};
use crate::{DONE_SENTINEL, HALT_SENTINEL};

/// Incremental builder for one block.
#[derive(Default, Debug)]
pub struct BlockBuilder {
    steps: Vec<Step>,
}

impl BlockBuilder {
    /// Start an empty block.
    pub fn new() -> BlockBuilder {
        BlockBuilder { steps: Vec::new() }
    }

    /// Append an already-constructed step.
    pub fn push_step(&mut self, step: Step) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// Append a literal push.
    pub fn literal(&mut self, line: u32, value: Literal) -> &mut Self {
        self.push_step(Step::new(line, StepKind::PushLiteral { value }))
    }

    /// Append an int literal push.
    pub fn int(&mut self, line: u32, value: i32) -> &mut Self {
        self.literal(line, Literal::Int(value))
    }

    /// Append a long literal push.
    pub fn long(&mut self, line: u32, value: i64) -> &mut Self {
        self.literal(line, Literal::Long(value))
    }

    /// Append a double literal push.
    pub fn double(&mut self, line: u32, value: f64) -> &mut Self {
        self.literal(line, Literal::Double(value))
    }

    /// Append a string literal push.
    pub fn string(&mut self, line: u32, value: impl Into<String>) -> &mut Self {
        self.literal(line, Literal::Str(value.into()))
    }

    /// Append a variable read.
    pub fn get(&mut self, line: u32, name: impl Into<String>) -> &mut Self {
        self.push_step(Step::new(line, StepKind::Get { name: name.into() }))
    }

    /// Append a container-element resolution.
    pub fn index(
        &mut self,
        line: u32,
        source: BlockRef,
        name: impl Into<String>,
        index: BlockRef,
    ) -> &mut Self {
        self.push_step(Step::new(
            line,
            StepKind::Index {
                source,
                name: name.into(),
                index,
            },
        ))
    }

    /// Append an assignment.
    pub fn assign(&mut self, line: u32, lhs: BlockRef, rhs: BlockRef) -> &mut Self {
        self.push_step(Step::new(line, StepKind::Assign { lhs, rhs }))
    }

    /// Append a destructuring assignment.
    pub fn assign_tuple(&mut self, line: u32, targets: Vec<BlockRef>, rhs: BlockRef) -> &mut Self {
        self.push_step(Step::new(line, StepKind::AssignTuple { targets, rhs }))
    }

    /// Append a named function call.
    pub fn call(&mut self, line: u32, name: impl Into<String>, args: BlockRef) -> &mut Self {
        self.push_step(Step::new(
            line,
            StepKind::Call {
                name: name.into(),
                args,
            },
        ))
    }

    /// Append an operator dispatch.
    pub fn operate(
        &mut self,
        line: u32,
        symbol: impl Into<String>,
        operands: BlockRef,
    ) -> &mut Self {
        self.push_step(Step::new(
            line,
            StepKind::Operate {
                symbol: symbol.into(),
                operands,
            },
        ))
    }

    /// Append a branch on a check chain.
    pub fn decide(
        &mut self,
        line: u32,
        check: Check,
        if_true: BlockRef,
        if_false: Option<BlockRef>,
    ) -> &mut Self {
        self.push_step(Step::new(
            line,
            StepKind::Decide {
                check,
                if_true,
                if_false,
            },
        ))
    }

    /// Append a condition-checked loop.
    pub fn goto(
        &mut self,
        line: u32,
        check: Check,
        body: BlockRef,
        increment: Option<BlockRef>,
    ) -> &mut Self {
        self.push_step(Step::new(
            line,
            StepKind::Goto {
                check,
                body,
                increment,
            },
        ))
    }

    /// Append a foreach loop.
    pub fn foreach(
        &mut self,
        line: u32,
        source: BlockRef,
        key: Option<String>,
        value: impl Into<String>,
        body: BlockRef,
    ) -> &mut Self {
        self.push_step(Step::new(
            line,
            StepKind::Foreach {
                source,
                key,
                value: value.into(),
                body,
            },
        ))
    }

    /// Append a flow-control request.
    pub fn flow(&mut self, line: u32, kind: FlowKind, value: Option<BlockRef>) -> &mut Self {
        self.push_step(Step::new(line, StepKind::Flow { kind, value }))
    }

    /// Append a plain return.
    pub fn ret(&mut self, line: u32, value: Option<BlockRef>) -> &mut Self {
        self.flow(line, FlowKind::Return, value)
    }

    /// Append a break.
    pub fn brk(&mut self, line: u32) -> &mut Self {
        self.flow(line, FlowKind::Break, None)
    }

    /// Append a continue.
    pub fn cont(&mut self, line: u32) -> &mut Self {
        self.flow(line, FlowKind::Continue, None)
    }

    /// Append a yield.
    pub fn yld(&mut self, line: u32, value: Option<BlockRef>) -> &mut Self {
        self.flow(line, FlowKind::Yield, value)
    }

    /// Append the `done` shorthand: a return carrying its sentinel.
    pub fn done(&mut self, line: u32) -> &mut Self {
        let mut value = BlockBuilder::new();
        value.int(line, DONE_SENTINEL);
        self.flow(line, FlowKind::Return, Some(value.finish()))
    }

    /// Append the `halt` shorthand: a return carrying its sentinel.
    pub fn halt(&mut self, line: u32) -> &mut Self {
        let mut value = BlockBuilder::new();
        value.int(line, HALT_SENTINEL);
        self.flow(line, FlowKind::Return, Some(value.finish()))
    }

    /// Append a closure capture.
    pub fn create_closure(&mut self, line: u32, body: BlockRef) -> &mut Self {
        self.push_step(Step::new(line, StepKind::CreateClosure { body }))
    }

    /// Append a named-subroutine declaration.
    pub fn bind(
        &mut self,
        line: u32,
        keyword: impl Into<String>,
        name: impl Into<String>,
        body: BlockRef,
    ) -> &mut Self {
        self.push_step(Step::new(
            line,
            StepKind::Bind {
                keyword: keyword.into(),
                name: name.into(),
                body,
            },
        ))
    }

    /// Append an event-filtered subroutine declaration.
    pub fn bind_filter(
        &mut self,
        line: u32,
        keyword: impl Into<String>,
        name: impl Into<String>,
        filter: BlockRef,
        body: BlockRef,
    ) -> &mut Self {
        self.push_step(Step::new(
            line,
            StepKind::BindFilter {
                keyword: keyword.into(),
                name: name.into(),
                filter,
                body,
            },
        ))
    }

    /// Append a host-object construction.
    pub fn object_new(&mut self, line: u32, class: impl Into<String>, args: BlockRef) -> &mut Self {
        self.push_step(Step::new(
            line,
            StepKind::ObjectNew {
                class: class.into(),
                args,
            },
        ))
    }

    /// Append a host-object member access.
    pub fn object_access(
        &mut self,
        line: u32,
        target: BlockRef,
        member: impl Into<String>,
        args: Option<BlockRef>,
    ) -> &mut Self {
        self.push_step(Step::new(
            line,
            StepKind::ObjectAccess {
                target,
                member: member.into(),
                args,
            },
        ))
    }

    /// Append a static host-class member access.
    pub fn object_access_static(
        &mut self,
        line: u32,
        class: impl Into<String>,
        member: impl Into<String>,
        args: BlockRef,
    ) -> &mut Self {
        self.push_step(Step::new(
            line,
            StepKind::ObjectAccessStatic {
                class: class.into(),
                member: member.into(),
                args,
            },
        ))
    }

    /// Finish the block.
    pub fn finish(&mut self) -> BlockRef {
        Block::new(std::mem::take(&mut self.steps))
    }
}
