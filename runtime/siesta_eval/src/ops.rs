//! The core operator/predicate bridge.
//!
//! The numeric promotion contract is only observable through operator
//! dispatch, so the runtime ships this one bridge: arithmetic, shifts,
//! string concatenation, the pair-construction operator, and the comparison
//! predicates. It registers through the same public API as any embedder
//! bridge; the engine never special-cases it. Full string/math/IO libraries
//! are bridge territory, not core.

use std::cmp::Ordering;
use std::sync::Arc;

use siesta_value::{arith, KeyValuePair, Scalar};

use crate::context::ScriptContext;
use crate::errors::{missing_operator, missing_predicate, EvalError, EvalResult};
use crate::frame::Frame;
use crate::registry::{Operator, Predicate, SharedRegistry};

struct CoreOps;

impl CoreOps {
    /// Pop a binary pair. Pop order is rightmost first, so the right
    /// operand comes off before the left.
    fn operands(args: &mut Frame) -> (Scalar, Scalar) {
        let right = args.pop_or_empty();
        let left = args.pop_or_empty();
        (left, right)
    }
}

impl Operator for CoreOps {
    fn operate(&self, symbol: &str, _ctx: &mut ScriptContext<'_>, args: &mut Frame) -> EvalResult {
        let (left, right) = CoreOps::operands(args);
        match symbol {
            "+" => Ok(arith::add(&left, &right)),
            "-" => Ok(arith::sub(&left, &right)),
            "*" => Ok(arith::mul(&left, &right)),
            "/" => Ok(arith::div(&left, &right)?),
            "%" => Ok(arith::rem(&left, &right)?),
            "<<" => Ok(arith::shl(&left, &right)),
            ">>" => Ok(arith::shr(&left, &right)),
            // Concatenation stringifies both sides.
            "." => Ok(Scalar::string(format!("{left}{right}"))),
            "=>" => Ok(Scalar::object(KeyValuePair::new(left.copy_of(), right))),
            _ => Err(missing_operator(symbol)),
        }
    }
}

impl Predicate for CoreOps {
    fn decide(
        &self,
        name: &str,
        _ctx: &mut ScriptContext<'_>,
        args: &mut Frame,
    ) -> Result<bool, EvalError> {
        let (left, right) = CoreOps::operands(args);
        match name {
            "==" => Ok(arith::compare(&left, &right) == Ordering::Equal),
            "!=" => Ok(arith::compare(&left, &right) != Ordering::Equal),
            "<" => Ok(arith::compare(&left, &right) == Ordering::Less),
            ">" => Ok(arith::compare(&left, &right) == Ordering::Greater),
            "<=" => Ok(arith::compare(&left, &right) != Ordering::Greater),
            ">=" => Ok(arith::compare(&left, &right) != Ordering::Less),
            "eq" => Ok(left.string_value() == right.string_value()),
            "ne" => Ok(left.string_value() != right.string_value()),
            // Identity of the underlying payload, not value equality.
            "is" => Ok(left.identity_eq(&right)),
            _ => Err(missing_predicate(name)),
        }
    }
}

/// Register the core operators and predicates.
pub fn register_core(registry: &SharedRegistry) {
    let ops = Arc::new(CoreOps);
    for symbol in ["+", "-", "*", "/", "%", "<<", ">>", ".", "=>"] {
        registry.register_operator(symbol, ops.clone());
    }
    for name in ["==", "!=", "<", ">", "<=", ">=", "eq", "ne", "is"] {
        registry.register_predicate(name, ops.clone());
    }
}
