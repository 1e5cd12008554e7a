//! Evaluation errors and their factory functions.
//!
//! Most of these are recoverable script-level faults: the enclosing block
//! converts them into a warning and continues with the empty scalar. Only
//! [`EvalError::Fatal`] unwinds evaluation; frame-discipline violations are
//! not errors at all - they panic, because continuing would corrupt shared
//! state.

use siesta_value::arith::ArithError;
use siesta_value::{ContainerError, ScalarType};

/// Result of evaluating a step or dispatching into a bridge.
pub type EvalResult = Result<siesta_value::Scalar, EvalError>;

/// Evaluation fault.
#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum EvalError {
    /// No function registered under the called name.
    #[error("undefined function {name}")]
    MissingFunction {
        /// The name as called.
        name: String,
    },

    /// No operator registered under the dispatched token.
    #[error("undefined operator {symbol}")]
    MissingOperator {
        /// The token as dispatched.
        symbol: String,
    },

    /// No predicate registered under the checked name.
    #[error("undefined predicate {name}")]
    MissingPredicate {
        /// The name as checked.
        name: String,
    },

    /// No binder registered under the declaration keyword.
    #[error("undefined environment keyword {keyword}")]
    MissingBinder {
        /// The keyword as declared.
        keyword: String,
    },

    /// No host class registered under the referenced name.
    #[error("undefined class {name}")]
    MissingClass {
        /// The name as referenced.
        name: String,
    },

    /// A host class has no member matching the access.
    #[error("no member {member} on {class} taking {argc} argument(s)")]
    MissingMember {
        /// The class's registered name.
        class: String,
        /// The member as accessed.
        member: String,
        /// The argument count offered.
        argc: usize,
    },

    /// A member access landed on a non-object scalar.
    #[error("cannot access member of {found} value")]
    NotAnObject {
        /// The scalar's actual type.
        found: ScalarType,
    },

    /// A closure invocation landed on a scalar that holds no closure.
    #[error("cannot invoke {found} value as a closure")]
    NotAClosure {
        /// The scalar's actual type.
        found: ScalarType,
    },

    /// A foreach source was neither array nor hash.
    #[error("cannot iterate {found} value")]
    NotIterable {
        /// The scalar's actual type.
        found: ScalarType,
    },

    /// A container operation failed.
    #[error(transparent)]
    Container(#[from] ContainerError),

    /// Arithmetic failed.
    #[error(transparent)]
    Arith(#[from] ArithError),

    /// A bridge reported a failure.
    #[error("{message}")]
    Bridge {
        /// The bridge's own description of the fault.
        message: String,
    },

    /// A bridge panicked; the panic was contained at the dispatch boundary.
    #[error("bridge panicked: {message}")]
    BridgePanic {
        /// Whatever the panic payload rendered to.
        message: String,
    },

    /// The target script instance has been unloaded and is inert.
    #[error("script {name} has been unloaded")]
    Unloaded {
        /// The instance's name.
        name: String,
    },

    /// A fault the raiser flagged as unrecoverable. Unwinds evaluation
    /// instead of degrading to a warning.
    #[error("fatal: {message}")]
    Fatal {
        /// Description of the failure.
        message: String,
    },
}

impl EvalError {
    /// Whether this fault aborts evaluation instead of degrading to a
    /// warning.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EvalError::Fatal { .. })
    }
}

/// A missing-function fault.
pub fn missing_function(name: impl Into<String>) -> EvalError {
    EvalError::MissingFunction { name: name.into() }
}

/// A missing-operator fault.
pub fn missing_operator(symbol: impl Into<String>) -> EvalError {
    EvalError::MissingOperator {
        symbol: symbol.into(),
    }
}

/// A missing-predicate fault.
pub fn missing_predicate(name: impl Into<String>) -> EvalError {
    EvalError::MissingPredicate { name: name.into() }
}

/// A missing-binder fault.
pub fn missing_binder(keyword: impl Into<String>) -> EvalError {
    EvalError::MissingBinder {
        keyword: keyword.into(),
    }
}

/// A missing-class fault.
pub fn missing_class(name: impl Into<String>) -> EvalError {
    EvalError::MissingClass { name: name.into() }
}

/// A missing-member fault.
pub fn missing_member(
    class: impl Into<String>,
    member: impl Into<String>,
    argc: usize,
) -> EvalError {
    EvalError::MissingMember {
        class: class.into(),
        member: member.into(),
        argc,
    }
}

/// A bridge-reported fault.
pub fn bridge_error(message: impl Into<String>) -> EvalError {
    EvalError::Bridge {
        message: message.into(),
    }
}

/// An unrecoverable fault.
pub fn fatal(message: impl Into<String>) -> EvalError {
    EvalError::Fatal {
        message: message.into(),
    }
}
