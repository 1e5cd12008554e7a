//! Key/value association pairs.

use std::any::Any;
use std::fmt;

use crate::object::HostObject;
use crate::scalar::Scalar;

/// Immutable pair of (key, value) scalars.
///
/// Produced by the pair-construction operator; used as the element type when
/// building hash literals and as a generic association carrier, for example
/// named-argument passing. The pair itself is immutable - the scalars inside
/// remain live handles.
#[derive(Clone, Debug)]
pub struct KeyValuePair {
    key: Scalar,
    value: Scalar,
}

impl KeyValuePair {
    /// Pair a key with a value.
    pub fn new(key: Scalar, value: Scalar) -> KeyValuePair {
        KeyValuePair { key, value }
    }

    /// The key scalar.
    pub fn key(&self) -> &Scalar {
        &self.key
    }

    /// The value scalar.
    pub fn value(&self) -> &Scalar {
        &self.value
    }
}

impl fmt::Display for KeyValuePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

impl HostObject for KeyValuePair {
    fn type_name(&self) -> &'static str {
        "KeyValuePair"
    }

    fn describe(&self) -> String {
        self.to_string()
    }

    fn as_any(&self) -> &(dyn Any + Send + Sync) {
        self
    }
}
