//! Siesta Value - the runtime value model for the Siesta scripting runtime.
//!
//! This crate provides:
//! - [`Scalar`]: the universal tagged value handle (primitive, object, or
//!   container-shaped)
//! - [`ScalarArray`] / [`ScalarHash`]: container capability traits with
//!   interchangeable backings
//! - [`KeyValuePair`]: the association carrier built by the pair operator
//! - [`HostObject`] / [`ObjectRef`]: opaque host-platform payloads
//! - Numeric promotion and fixed-width arithmetic in [`arith`]
//!
//! # Copy semantics
//!
//! Assignment between scalars always copies the source's current facet into
//! the destination's storage: scalars are value-typed containers, never
//! aliases of each other. The exception is the payload itself - an array,
//! hash, or host object is shared by reference, so two scalars viewing the
//! same array mutate the same underlying sequence.
//!
//! # Thread safety
//!
//! Scalars cross thread boundaries when a script forks, so every shared cell
//! uses `Arc` with `parking_lot` locks.

pub mod arith;
mod array;
mod errors;
mod hash;
mod object;
mod pair;
mod scalar;

pub use array::{ArrayRef, ReadOnlyArray, ScalarArray, ScalarComparator, VecArray, ViewArray};
pub use errors::ContainerError;
pub use hash::{HashRef, MapHash, ScalarHash};
pub use object::{HostObject, ObjectRef};
pub use pair::KeyValuePair;
pub use scalar::{Scalar, ScalarType};
