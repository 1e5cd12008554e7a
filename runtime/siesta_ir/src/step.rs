//! Step and check node definitions.

use std::fmt;

use crate::block::BlockRef;

/// Intended shape of a variable, derived from the leading character of its
/// name. The sigil is part of the name string, not a separate type tag.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Sigil {
    /// `$name` - a plain scalar.
    Scalar,
    /// `@name` - an array.
    Array,
    /// `%name` - a hash.
    Hash,
}

impl Sigil {
    /// Classify a variable name by its leading character.
    ///
    /// Names without a recognized sigil are treated as scalars.
    pub fn of(name: &str) -> Sigil {
        match name.as_bytes().first() {
            Some(b'@') => Sigil::Array,
            Some(b'%') => Sigil::Hash,
            _ => Sigil::Scalar,
        }
    }
}

/// A constant value embedded in the tree by the parser.
///
/// Literals are deliberately not runtime scalars: blocks are immutable and
/// shared, so each literal push constructs a fresh scalar at evaluation time.
#[derive(Clone, PartialEq, Debug)]
pub enum Literal {
    /// 32-bit integer constant.
    Int(i32),
    /// 64-bit integer constant.
    Long(i64),
    /// Double-precision float constant.
    Double(f64),
    /// String constant.
    Str(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Int(n) => write!(f, "{n}"),
            Literal::Long(n) => write!(f, "{n}L"),
            Literal::Double(d) => write!(f, "{d}"),
            Literal::Str(s) => write!(f, "'{s}'"),
        }
    }
}

/// The flow-control kind requested by a flow step.
///
/// A single step type parameterized by kind replaces per-kind node types;
/// the engine reads the pending (kind, value) pair off its environment.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum FlowKind {
    /// Return from the enclosing closure or script with a value.
    Return,
    /// Exit the innermost loop.
    Break,
    /// Skip to the next iteration of the innermost loop.
    Continue,
    /// Suspend the enclosing closure, leaving it resumable after this step.
    Yield,
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowKind::Return => f.write_str("return"),
            FlowKind::Break => f.write_str("break"),
            FlowKind::Continue => f.write_str("continue"),
            FlowKind::Yield => f.write_str("yield"),
        }
    }
}

/// A short-circuiting boolean condition node.
///
/// Checks form a binary tree: `and_then` is followed only when this node
/// decides true (AND composition), `or_else` only when it decides false
/// (OR composition). The setup block evaluates the predicate's operands.
#[derive(Clone, Debug)]
pub struct Check {
    name: String,
    negated: bool,
    setup: BlockRef,
    and_then: Option<Box<Check>>,
    or_else: Option<Box<Check>>,
    line: u32,
}

impl Check {
    /// Create a leaf check calling the named predicate.
    pub fn new(line: u32, name: impl Into<String>, setup: BlockRef) -> Check {
        Check {
            name: name.into(),
            negated: false,
            setup,
            and_then: None,
            or_else: None,
            line,
        }
    }

    /// Negate this node's decision before any chaining is applied.
    #[must_use]
    pub fn negated(mut self) -> Check {
        self.negated = !self.negated;
        self
    }

    /// Chain a check evaluated only when this one decides true.
    #[must_use]
    pub fn and_then(mut self, next: Check) -> Check {
        self.and_then = Some(Box::new(next));
        self
    }

    /// Chain a check evaluated only when this one decides false.
    #[must_use]
    pub fn or_else(mut self, next: Check) -> Check {
        self.or_else = Some(Box::new(next));
        self
    }

    /// Predicate name this node dispatches to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the predicate's decision is negated.
    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Operand setup block.
    pub fn setup(&self) -> &BlockRef {
        &self.setup
    }

    /// AND-linked continuation, if any.
    pub fn and_branch(&self) -> Option<&Check> {
        self.and_then.as_deref()
    }

    /// OR-linked continuation, if any.
    pub fn or_branch(&self) -> Option<&Check> {
        self.or_else.as_deref()
    }

    /// Source line of this node.
    pub fn line(&self) -> u32 {
        self.line
    }
}

/// One executable operation in a block.
#[derive(Clone, Debug)]
pub struct Step {
    line: u32,
    kind: StepKind,
}

impl Step {
    /// Create a step tagged with its source line.
    pub fn new(line: u32, kind: StepKind) -> Step {
        Step { line, kind }
    }

    /// Source line for diagnostics.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// The operation this step performs.
    pub fn kind(&self) -> &StepKind {
        &self.kind
    }
}

/// Every operation the engine can perform, one variant per step kind.
///
/// Evaluation of each variant returns the value it produced (the empty
/// scalar when it only has side effects) and may set a pending flow-control
/// request on the script environment.
#[derive(Clone, Debug)]
pub enum StepKind {
    /// Push a freshly constructed scalar for a constant.
    PushLiteral {
        /// The constant to construct.
        value: Literal,
    },
    /// Read a variable, declaring it with a sigil-shaped empty value on
    /// first access.
    Get {
        /// Full variable name, sigil included.
        name: String,
    },
    /// Resolve a container element handle, auto-vivifying the container
    /// and the element as needed.
    Index {
        /// Evaluates to the container scalar.
        source: BlockRef,
        /// Variable name whose sigil picks the auto-vivified shape.
        name: String,
        /// Evaluates to the index or key.
        index: BlockRef,
    },
    /// Copy the right-hand value into the left-hand handle.
    Assign {
        /// Evaluates to a settable scalar handle.
        lhs: BlockRef,
        /// Evaluates to the value to copy.
        rhs: BlockRef,
    },
    /// Destructuring assignment: positional when the value is an array,
    /// broadcast otherwise.
    AssignTuple {
        /// Each target evaluates to a settable scalar handle.
        targets: Vec<BlockRef>,
        /// Evaluates to the value to distribute.
        rhs: BlockRef,
    },
    /// Call a named function from the environment registry.
    Call {
        /// Function name as registered, sigil included.
        name: String,
        /// Argument steps; each step's result is pushed onto the frame
        /// in declaration order.
        args: BlockRef,
    },
    /// Dispatch an operator implementation by its token.
    Operate {
        /// Operator token as registered.
        symbol: String,
        /// Operand steps, pushed onto the frame in order.
        operands: BlockRef,
    },
    /// Branch on a check chain.
    Decide {
        /// Condition tree.
        check: Check,
        /// Taken when the chain decides true.
        if_true: BlockRef,
        /// Taken when the chain decides false.
        if_false: Option<BlockRef>,
    },
    /// Condition-checked loop, shared by `while` and `for` forms.
    Goto {
        /// Loop condition, re-checked before every iteration.
        check: Check,
        /// Loop body.
        body: BlockRef,
        /// Optional per-iteration block run after the body (`for` loops).
        increment: Option<BlockRef>,
    },
    /// Iterate an array's elements or a hash's keys.
    Foreach {
        /// Evaluates to the container to iterate.
        source: BlockRef,
        /// Key variable, when the source's keys (or synthesized indices)
        /// are wanted.
        key: Option<String>,
        /// Value variable bound each iteration.
        value: String,
        /// Loop body.
        body: BlockRef,
    },
    /// Request flow control with an optional value expression.
    Flow {
        /// The kind of request.
        kind: FlowKind,
        /// Evaluates to the carried value; the empty scalar when absent.
        value: Option<BlockRef>,
    },
    /// Capture the current script instance and a block into a closure value.
    CreateClosure {
        /// The closure's code.
        body: BlockRef,
    },
    /// Declare a named subroutine under a registered environment keyword.
    Bind {
        /// Environment keyword (for example `sub`).
        keyword: String,
        /// Declared name.
        name: String,
        /// Subroutine body.
        body: BlockRef,
    },
    /// Declare an event-filtered subroutine under a registered keyword.
    BindFilter {
        /// Environment keyword.
        keyword: String,
        /// Declared name.
        name: String,
        /// Evaluates to the filter parameter at bind time.
        filter: BlockRef,
        /// Subroutine body.
        body: BlockRef,
    },
    /// Construct a host object by registered class name.
    ObjectNew {
        /// Registered class name.
        class: String,
        /// Constructor argument steps.
        args: BlockRef,
    },
    /// Access a member of a host object instance.
    ObjectAccess {
        /// Evaluates to the object scalar.
        target: BlockRef,
        /// Member name.
        member: String,
        /// Call argument steps; absent for bare field-style access.
        args: Option<BlockRef>,
    },
    /// Access a static member of a registered host class.
    ObjectAccessStatic {
        /// Registered class name.
        class: String,
        /// Member name.
        member: String,
        /// Call argument steps.
        args: BlockRef,
    },
}
