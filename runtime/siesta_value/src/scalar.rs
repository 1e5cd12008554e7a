//! The universal scalar value handle.
//!
//! A [`Scalar`] is a shared handle to one mutable value cell. Cloning a
//! `Scalar` clones the *handle* - both clones view the same cell, which is
//! what lets an array element or variable binding be assigned through.
//! Copying the *value* is always explicit, via [`Scalar::set_from`] or
//! [`Scalar::copy_of`].

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::array::{ArrayRef, VecArray};
use crate::errors::ContainerError;
use crate::hash::{HashRef, MapHash};
use crate::object::{HostObject, ObjectRef};

/// The observable type of a scalar's current facet.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ScalarType {
    /// The empty value: simultaneously 0, `""`, and false.
    Empty,
    /// 32-bit integer.
    Int,
    /// 64-bit integer.
    Long,
    /// Double-precision float.
    Double,
    /// String.
    String,
    /// Opaque host object.
    Object,
    /// Array-shaped container handle.
    Array,
    /// Hash-shaped container handle.
    Hash,
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Empty => "empty",
            ScalarType::Int => "int",
            ScalarType::Long => "long",
            ScalarType::Double => "double",
            ScalarType::String => "string",
            ScalarType::Object => "object",
            ScalarType::Array => "array",
            ScalarType::Hash => "hash",
        };
        f.write_str(name)
    }
}

/// Primitive slot of a scalar.
#[derive(Clone, Debug, Default)]
enum Primitive {
    #[default]
    Empty,
    Int(i32),
    Long(i64),
    Double(f64),
    Str(String),
    Object(ObjectRef),
}

/// Container facet layered on top of the primitive slot. Array and hash are
/// mutually exclusive; a container-shaped scalar still carries its primitive
/// slot (normally the empty sentinel) until reassigned.
#[derive(Clone, Debug, Default)]
enum Facet {
    #[default]
    None,
    Array(ArrayRef),
    Hash(HashRef),
}

#[derive(Clone, Debug, Default)]
struct ScalarRepr {
    value: Primitive,
    facet: Facet,
}

/// The universal value handle.
#[derive(Clone, Debug)]
pub struct Scalar {
    cell: Arc<RwLock<ScalarRepr>>,
}

impl Scalar {
    fn from_repr(repr: ScalarRepr) -> Scalar {
        Scalar {
            cell: Arc::new(RwLock::new(repr)),
        }
    }

    /// A fresh empty scalar.
    ///
    /// Every call yields an independent cell; emptiness is a marker value,
    /// never a shared mutable container.
    pub fn empty() -> Scalar {
        Scalar::from_repr(ScalarRepr::default())
    }

    /// A 32-bit integer scalar.
    pub fn int(value: i32) -> Scalar {
        Scalar::from_repr(ScalarRepr {
            value: Primitive::Int(value),
            facet: Facet::None,
        })
    }

    /// A 64-bit integer scalar.
    pub fn long(value: i64) -> Scalar {
        Scalar::from_repr(ScalarRepr {
            value: Primitive::Long(value),
            facet: Facet::None,
        })
    }

    /// A double scalar.
    pub fn double(value: f64) -> Scalar {
        Scalar::from_repr(ScalarRepr {
            value: Primitive::Double(value),
            facet: Facet::None,
        })
    }

    /// A string scalar.
    pub fn string(value: impl Into<String>) -> Scalar {
        Scalar::from_repr(ScalarRepr {
            value: Primitive::Str(value.into()),
            facet: Facet::None,
        })
    }

    /// An object scalar wrapping a host payload.
    pub fn object(payload: impl HostObject) -> Scalar {
        Scalar::object_ref(ObjectRef::new(payload))
    }

    /// An object scalar from an existing payload handle.
    pub fn object_ref(object: ObjectRef) -> Scalar {
        Scalar::from_repr(ScalarRepr {
            value: Primitive::Object(object),
            facet: Facet::None,
        })
    }

    /// An array-shaped scalar viewing an existing container.
    pub fn array(array: ArrayRef) -> Scalar {
        Scalar::from_repr(ScalarRepr {
            value: Primitive::Empty,
            facet: Facet::Array(array),
        })
    }

    /// An array-shaped scalar over a fresh growable container.
    pub fn new_array() -> Scalar {
        Scalar::array(ArrayRef::new(VecArray::new()))
    }

    /// A hash-shaped scalar viewing an existing container.
    pub fn hash(hash: HashRef) -> Scalar {
        Scalar::from_repr(ScalarRepr {
            value: Primitive::Empty,
            facet: Facet::Hash(hash),
        })
    }

    /// A hash-shaped scalar over a fresh container.
    pub fn new_hash() -> Scalar {
        Scalar::hash(HashRef::new(MapHash::new()))
    }

    /// An independent scalar holding a copy of this one's current facet.
    pub fn copy_of(&self) -> Scalar {
        Scalar::from_repr(self.cell.read().clone())
    }

    /// Copy another scalar's current facet into this cell.
    ///
    /// This is assignment: the destination becomes an independent value,
    /// except that a container or object payload is shared by reference.
    pub fn set_from(&self, source: &Scalar) {
        if Arc::ptr_eq(&self.cell, &source.cell) {
            return;
        }
        let repr = source.cell.read().clone();
        *self.cell.write() = repr;
    }

    /// The current facet's observable type.
    pub fn scalar_type(&self) -> ScalarType {
        let repr = self.cell.read();
        match (&repr.facet, &repr.value) {
            (Facet::Array(_), _) => ScalarType::Array,
            (Facet::Hash(_), _) => ScalarType::Hash,
            (Facet::None, Primitive::Empty) => ScalarType::Empty,
            (Facet::None, Primitive::Int(_)) => ScalarType::Int,
            (Facet::None, Primitive::Long(_)) => ScalarType::Long,
            (Facet::None, Primitive::Double(_)) => ScalarType::Double,
            (Facet::None, Primitive::Str(_)) => ScalarType::String,
            (Facet::None, Primitive::Object(_)) => ScalarType::Object,
        }
    }

    /// Whether this scalar is the empty marker (no facet, empty primitive).
    pub fn is_empty(&self) -> bool {
        self.scalar_type() == ScalarType::Empty
    }

    /// Whether this scalar is array-shaped.
    pub fn is_array(&self) -> bool {
        matches!(self.cell.read().facet, Facet::Array(_))
    }

    /// Whether this scalar is hash-shaped.
    pub fn is_hash(&self) -> bool {
        matches!(self.cell.read().facet, Facet::Hash(_))
    }

    /// The array container, when array-shaped.
    pub fn array_value(&self) -> Option<ArrayRef> {
        match &self.cell.read().facet {
            Facet::Array(a) => Some(a.clone()),
            _ => None,
        }
    }

    /// The hash container, when hash-shaped.
    pub fn hash_value(&self) -> Option<HashRef> {
        match &self.cell.read().facet {
            Facet::Hash(h) => Some(h.clone()),
            _ => None,
        }
    }

    /// The object payload, when object-typed.
    pub fn object_value(&self) -> Option<ObjectRef> {
        let repr = self.cell.read();
        match (&repr.facet, &repr.value) {
            (Facet::None, Primitive::Object(o)) => Some(o.clone()),
            _ => None,
        }
    }

    /// Make this scalar array-shaped, installing a fresh growable container
    /// if it is currently the empty scalar.
    pub fn vivify_array(&self) -> Result<ArrayRef, ContainerError> {
        let mut repr = self.cell.write();
        match &repr.facet {
            Facet::Array(a) => Ok(a.clone()),
            Facet::Hash(_) => Err(ContainerError::Shape {
                expected: ScalarType::Array,
                found: ScalarType::Hash,
            }),
            Facet::None => {
                if matches!(repr.value, Primitive::Empty) {
                    let array = ArrayRef::new(VecArray::new());
                    repr.facet = Facet::Array(array.clone());
                    Ok(array)
                } else {
                    Err(ContainerError::Shape {
                        expected: ScalarType::Array,
                        found: primitive_type(&repr.value),
                    })
                }
            }
        }
    }

    /// Make this scalar hash-shaped, installing a fresh container if it is
    /// currently the empty scalar.
    pub fn vivify_hash(&self) -> Result<HashRef, ContainerError> {
        let mut repr = self.cell.write();
        match &repr.facet {
            Facet::Hash(h) => Ok(h.clone()),
            Facet::Array(_) => Err(ContainerError::Shape {
                expected: ScalarType::Hash,
                found: ScalarType::Array,
            }),
            Facet::None => {
                if matches!(repr.value, Primitive::Empty) {
                    let hash = HashRef::new(MapHash::new());
                    repr.facet = Facet::Hash(hash.clone());
                    Ok(hash)
                } else {
                    Err(ContainerError::Shape {
                        expected: ScalarType::Hash,
                        found: primitive_type(&repr.value),
                    })
                }
            }
        }
    }

    /// 32-bit integer interpretation of the primitive slot.
    #[allow(clippy::cast_possible_truncation)]
    pub fn int_value(&self) -> i32 {
        match &self.cell.read().value {
            Primitive::Empty | Primitive::Object(_) => 0,
            Primitive::Int(n) => *n,
            Primitive::Long(n) => *n as i32,
            Primitive::Double(d) => *d as i32,
            Primitive::Str(s) => parse_long(s) as i32,
        }
    }

    /// 64-bit integer interpretation of the primitive slot.
    #[allow(clippy::cast_possible_truncation)]
    pub fn long_value(&self) -> i64 {
        match &self.cell.read().value {
            Primitive::Empty | Primitive::Object(_) => 0,
            Primitive::Int(n) => i64::from(*n),
            Primitive::Long(n) => *n,
            Primitive::Double(d) => *d as i64,
            Primitive::Str(s) => parse_long(s),
        }
    }

    /// Double interpretation of the primitive slot.
    #[allow(clippy::cast_precision_loss)]
    pub fn double_value(&self) -> f64 {
        match &self.cell.read().value {
            Primitive::Empty | Primitive::Object(_) => 0.0,
            Primitive::Int(n) => f64::from(*n),
            Primitive::Long(n) => *n as f64,
            Primitive::Double(d) => *d,
            Primitive::Str(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        }
    }

    /// String interpretation of the current facet.
    pub fn string_value(&self) -> String {
        self.to_string()
    }

    /// Reference identity of the underlying payload, as the `is` operator
    /// sees it. Two empty scalars are identical; containers and objects
    /// compare by allocation; primitives are never identical.
    pub fn identity_eq(&self, other: &Scalar) -> bool {
        if Arc::ptr_eq(&self.cell, &other.cell) {
            return true;
        }
        let a = self.cell.read();
        let b = other.cell.read();
        match (&a.facet, &b.facet) {
            (Facet::Array(x), Facet::Array(y)) => x.ptr_eq(y),
            (Facet::Hash(x), Facet::Hash(y)) => x.ptr_eq(y),
            (Facet::None, Facet::None) => match (&a.value, &b.value) {
                (Primitive::Empty, Primitive::Empty) => true,
                (Primitive::Object(x), Primitive::Object(y)) => x.ptr_eq(y),
                _ => false,
            },
            _ => false,
        }
    }

    /// Structural sameness, as remove-by-value sees it: numeric pairs
    /// compare after promotion, containers and objects by identity,
    /// everything else by string rendering.
    pub fn structural_eq(&self, other: &Scalar) -> bool {
        use ScalarType as T;
        let (ta, tb) = (self.scalar_type(), other.scalar_type());
        match (ta, tb) {
            (T::Empty, T::Empty) => true,
            (T::Array | T::Hash | T::Object, _) | (_, T::Array | T::Hash | T::Object) => {
                self.identity_eq(other)
            }
            (T::Int | T::Long | T::Double, T::Int | T::Long | T::Double) => {
                crate::arith::compare(self, other) == std::cmp::Ordering::Equal
            }
            _ => self.string_value() == other.string_value(),
        }
    }
}

impl Default for Scalar {
    fn default() -> Scalar {
        Scalar::empty()
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = self.cell.read();
        match &repr.facet {
            Facet::Array(a) => return write!(f, "@array[{}]", a.read().len()),
            Facet::Hash(h) => return write!(f, "%hash[{}]", h.read().len()),
            Facet::None => {}
        }
        match &repr.value {
            Primitive::Empty => Ok(()),
            Primitive::Int(n) => write!(f, "{n}"),
            Primitive::Long(n) => write!(f, "{n}"),
            Primitive::Double(d) => f.write_str(&fmt_double(*d)),
            Primitive::Str(s) => f.write_str(s),
            Primitive::Object(o) => f.write_str(&o.describe()),
        }
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Scalar {
        Scalar::int(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Scalar {
        Scalar::long(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Scalar {
        Scalar::double(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Scalar {
        Scalar::string(value)
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Scalar {
        Scalar::string(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Scalar {
        Scalar::int(i32::from(value))
    }
}

fn primitive_type(value: &Primitive) -> ScalarType {
    match value {
        Primitive::Empty => ScalarType::Empty,
        Primitive::Int(_) => ScalarType::Int,
        Primitive::Long(_) => ScalarType::Long,
        Primitive::Double(_) => ScalarType::Double,
        Primitive::Str(_) => ScalarType::String,
        Primitive::Object(_) => ScalarType::Object,
    }
}

/// Integer interpretation of a string: whole-number parse first, then a
/// float parse truncated toward zero, then 0.
#[allow(clippy::cast_possible_truncation)]
fn parse_long(s: &str) -> i64 {
    let t = s.trim();
    if let Ok(n) = t.parse::<i64>() {
        return n;
    }
    t.parse::<f64>().map(|d| d as i64).unwrap_or(0)
}

/// Doubles render with a trailing `.0` when integral, matching the way the
/// host language formats them (observable through string concatenation).
fn fmt_double(d: f64) -> String {
    if d.is_finite() && d.fract() == 0.0 && d.abs() < 1e15 {
        format!("{d:.1}")
    } else {
        format!("{d}")
    }
}
