//! Container operation errors.

use crate::scalar::ScalarType;

/// Error returned by container capability methods.
///
/// These are script-level faults: the engine converts them into warnings at
/// the enclosing block, never aborts.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    /// A mutating operation was invoked on a read-only wrapper.
    #[error("array is read-only")]
    ReadOnly,

    /// Pop was invoked on an empty array.
    #[error("pop from empty array")]
    Underflow,

    /// An index fell outside a fixed-length view.
    #[error("index {index} out of range for view of {len}")]
    OutOfRange {
        /// The requested index.
        index: usize,
        /// The view's length.
        len: usize,
    },

    /// A scalar already shaped one way was used as the other container kind.
    #[error("expected {expected} value, found {found}")]
    Shape {
        /// The shape the operation needed.
        expected: ScalarType,
        /// The shape the scalar actually has.
        found: ScalarType,
    },
}
