//! Opaque host-platform object payloads.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// A host-platform value carried opaquely inside a scalar.
///
/// The value model treats these as inert payloads: identity comparison,
/// a type name, and a display string. Member dispatch lives in the engine's
/// interop layer, keyed by [`HostObject::type_name`].
pub trait HostObject: Send + Sync + fmt::Debug + 'static {
    /// Stable name used to find the object's class bridge.
    fn type_name(&self) -> &'static str;

    /// Human-readable rendering used when the scalar is stringified.
    fn describe(&self) -> String {
        format!("<{}>", self.type_name())
    }

    /// Downcast support.
    fn as_any(&self) -> &(dyn Any + Send + Sync);
}

/// Shared handle to a host object.
///
/// Cloning shares the payload; identity (`is`) compares the allocation.
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn HostObject>);

impl ObjectRef {
    /// Wrap a host object.
    pub fn new(object: impl HostObject) -> ObjectRef {
        ObjectRef(Arc::new(object))
    }

    /// The payload's class-bridge key.
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }

    /// The payload's display string.
    pub fn describe(&self) -> String {
        self.0.describe()
    }

    /// Reference identity of the payload allocation.
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Borrow the payload as a concrete type.
    pub fn downcast_ref<T: HostObject>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({:?})", self.0)
    }
}
