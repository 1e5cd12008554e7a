//! Numeric promotion and fixed-width arithmetic.
//!
//! Cross-type arithmetic and comparison promote both operands before
//! operating: if either is a double, both become doubles; else if either is
//! a 64-bit integer, both become 64-bit; else the operation runs on 32-bit
//! integers. Division, modulo, and shift follow native fixed-width semantics
//! of the chosen width, with overflow wrapping - there is no silent widening
//! beyond the promotion ladder.

use std::cmp::Ordering;

use crate::scalar::{Scalar, ScalarType};

/// A pair of operands promoted to their common width.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum NumericPair {
    /// Both operands as 32-bit integers.
    Int(i32, i32),
    /// Both operands as 64-bit integers.
    Long(i64, i64),
    /// Both operands as doubles.
    Double(f64, f64),
}

/// Arithmetic faults. Script-level: the engine degrades them to warnings.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ArithError {
    /// Integer division by zero.
    #[error("division by zero")]
    DivisionByZero,
    /// Integer modulo by zero.
    #[error("modulo by zero")]
    ModuloByZero,
}

fn width_of(scalar: &Scalar) -> ScalarType {
    match scalar.scalar_type() {
        ScalarType::Double => ScalarType::Double,
        ScalarType::Long => ScalarType::Long,
        // Strings, empties, and everything else contribute their integer
        // interpretation at 32-bit width.
        _ => ScalarType::Int,
    }
}

/// Promote two operands to their common numeric width.
pub fn promote(a: &Scalar, b: &Scalar) -> NumericPair {
    match (width_of(a), width_of(b)) {
        (ScalarType::Double, _) | (_, ScalarType::Double) => {
            NumericPair::Double(a.double_value(), b.double_value())
        }
        (ScalarType::Long, _) | (_, ScalarType::Long) => {
            NumericPair::Long(a.long_value(), b.long_value())
        }
        _ => NumericPair::Int(a.int_value(), b.int_value()),
    }
}

/// `a + b` at the promoted width.
pub fn add(a: &Scalar, b: &Scalar) -> Scalar {
    match promote(a, b) {
        NumericPair::Int(x, y) => Scalar::int(x.wrapping_add(y)),
        NumericPair::Long(x, y) => Scalar::long(x.wrapping_add(y)),
        NumericPair::Double(x, y) => Scalar::double(x + y),
    }
}

/// `a - b` at the promoted width.
pub fn sub(a: &Scalar, b: &Scalar) -> Scalar {
    match promote(a, b) {
        NumericPair::Int(x, y) => Scalar::int(x.wrapping_sub(y)),
        NumericPair::Long(x, y) => Scalar::long(x.wrapping_sub(y)),
        NumericPair::Double(x, y) => Scalar::double(x - y),
    }
}

/// `a * b` at the promoted width.
pub fn mul(a: &Scalar, b: &Scalar) -> Scalar {
    match promote(a, b) {
        NumericPair::Int(x, y) => Scalar::int(x.wrapping_mul(y)),
        NumericPair::Long(x, y) => Scalar::long(x.wrapping_mul(y)),
        NumericPair::Double(x, y) => Scalar::double(x * y),
    }
}

/// `a / b` at the promoted width; integer widths truncate.
pub fn div(a: &Scalar, b: &Scalar) -> Result<Scalar, ArithError> {
    match promote(a, b) {
        NumericPair::Int(x, y) => {
            if y == 0 {
                return Err(ArithError::DivisionByZero);
            }
            Ok(Scalar::int(x.wrapping_div(y)))
        }
        NumericPair::Long(x, y) => {
            if y == 0 {
                return Err(ArithError::DivisionByZero);
            }
            Ok(Scalar::long(x.wrapping_div(y)))
        }
        NumericPair::Double(x, y) => Ok(Scalar::double(x / y)),
    }
}

/// `a % b` at the promoted width.
pub fn rem(a: &Scalar, b: &Scalar) -> Result<Scalar, ArithError> {
    match promote(a, b) {
        NumericPair::Int(x, y) => {
            if y == 0 {
                return Err(ArithError::ModuloByZero);
            }
            Ok(Scalar::int(x.wrapping_rem(y)))
        }
        NumericPair::Long(x, y) => {
            if y == 0 {
                return Err(ArithError::ModuloByZero);
            }
            Ok(Scalar::long(x.wrapping_rem(y)))
        }
        NumericPair::Double(x, y) => Ok(Scalar::double(x % y)),
    }
}

/// `a << b` at the promoted integer width; doubles shift as 64-bit.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn shl(a: &Scalar, b: &Scalar) -> Scalar {
    match promote(a, b) {
        NumericPair::Int(x, y) => Scalar::int(x.wrapping_shl(y as u32)),
        NumericPair::Long(x, y) => Scalar::long(x.wrapping_shl(y as u32)),
        NumericPair::Double(x, y) => Scalar::long((x as i64).wrapping_shl(y as u32)),
    }
}

/// `a >> b` (arithmetic) at the promoted integer width.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub fn shr(a: &Scalar, b: &Scalar) -> Scalar {
    match promote(a, b) {
        NumericPair::Int(x, y) => Scalar::int(x.wrapping_shr(y as u32)),
        NumericPair::Long(x, y) => Scalar::long(x.wrapping_shr(y as u32)),
        NumericPair::Double(x, y) => Scalar::long((x as i64).wrapping_shr(y as u32)),
    }
}

/// Numeric ordering at the promoted width. NaN compares equal to keep the
/// ordering total for sort comparators.
pub fn compare(a: &Scalar, b: &Scalar) -> Ordering {
    match promote(a, b) {
        NumericPair::Int(x, y) => x.cmp(&y),
        NumericPair::Long(x, y) => x.cmp(&y),
        NumericPair::Double(x, y) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::scalar::ScalarType;

    mod promotion {
        use super::*;
        use super::assert_eq;

        #[test]
        fn int_plus_double_is_double() {
            let sum = add(&Scalar::int(2), &Scalar::double(2.0));
            assert_eq!(sum.scalar_type(), ScalarType::Double);
            assert_eq!(sum.string_value(), "4.0");
        }

        #[test]
        fn int_plus_long_is_long() {
            let sum = add(&Scalar::int(2), &Scalar::long(4_000_000_000));
            assert_eq!(sum.scalar_type(), ScalarType::Long);
            assert_eq!(sum.long_value(), 4_000_000_002);
        }

        #[test]
        fn int_pair_stays_int() {
            let sum = add(&Scalar::int(2), &Scalar::int(2));
            assert_eq!(sum.scalar_type(), ScalarType::Int);
        }

        #[test]
        fn strings_join_at_int_width() {
            assert_eq!(
                promote(&Scalar::string("3"), &Scalar::int(4)),
                NumericPair::Int(3, 4)
            );
        }
    }

    mod division {
        use super::*;
        use super::assert_eq;

        #[test]
        fn int_division_truncates() {
            let q = div(&Scalar::int(5), &Scalar::int(2));
            assert_eq!(q.map(|s| s.int_value()), Ok(2));
        }

        #[test]
        fn double_operand_floats_the_division() {
            let q = div(&Scalar::int(5), &Scalar::double(2.0));
            assert_eq!(q.map(|s| s.double_value()), Ok(2.5));
        }

        #[test]
        fn zero_divisor_is_an_error() {
            assert_eq!(
                div(&Scalar::int(1), &Scalar::int(0)).map(|_| ()),
                Err(ArithError::DivisionByZero)
            );
            assert_eq!(
                rem(&Scalar::int(1), &Scalar::int(0)).map(|_| ()),
                Err(ArithError::ModuloByZero)
            );
        }
    }

    mod fixed_width {
        use super::*;
        use super::assert_eq;

        #[test]
        fn int_overflow_wraps() {
            let sum = add(&Scalar::int(i32::MAX), &Scalar::int(1));
            assert_eq!(sum.int_value(), i32::MIN);
        }

        #[test]
        fn shifts_stay_at_promoted_width() {
            assert_eq!(shl(&Scalar::int(1), &Scalar::int(4)).int_value(), 16);
            assert_eq!(
                shl(&Scalar::long(1), &Scalar::int(40)).long_value(),
                1_i64 << 40
            );
            assert_eq!(shr(&Scalar::int(-8), &Scalar::int(1)).int_value(), -4);
        }
    }

    #[test]
    fn compare_spans_widths() {
        assert_eq!(compare(&Scalar::int(2), &Scalar::double(2.5)), Ordering::Less);
        assert_eq!(compare(&Scalar::long(7), &Scalar::int(7)), Ordering::Equal);
    }
}
