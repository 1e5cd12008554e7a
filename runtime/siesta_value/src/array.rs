//! Array containers: the `ScalarArray` capability and its backings.
//!
//! Three interchangeable backings:
//! - [`VecArray`]: the growable default.
//! - [`ViewArray`]: an O(1) offset/length view over a shared backing,
//!   covering the cheap sub-range capability.
//! - [`ReadOnlyArray`]: a wrapper over a host-supplied collection whose
//!   mutators fail with a read-only error.

use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::errors::ContainerError;
use crate::scalar::Scalar;

/// Comparator used by [`ScalarArray::sort`].
pub type ScalarComparator<'a> = &'a mut dyn FnMut(&Scalar, &Scalar) -> Ordering;

/// Ordered sequence of scalars.
///
/// `get` auto-extends with empty scalars when the index is at or past the
/// current size; indexed assignment relies on observing that extension.
/// Element scalars are live handles: mutating one mutates the stored value.
pub trait ScalarArray: Send + Sync + fmt::Debug {
    /// Append a value, returning the stored handle.
    fn push(&mut self, value: Scalar) -> Result<Scalar, ContainerError>;

    /// Remove and return the last element.
    fn pop(&mut self) -> Result<Scalar, ContainerError>;

    /// Number of elements.
    fn len(&self) -> usize;

    /// Whether the array has no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element handle at `index`, auto-extending with empty scalars up to
    /// and including the requested index.
    fn get(&mut self, index: usize) -> Result<Scalar, ContainerError>;

    /// Insert a value at `index`, shifting later elements.
    fn insert(&mut self, index: usize, value: Scalar) -> Result<(), ContainerError>;

    /// Remove and return the element at `index`.
    fn remove_at(&mut self, index: usize) -> Result<Scalar, ContainerError>;

    /// Remove the first element structurally matching `value`. Returns
    /// whether anything was removed.
    fn remove_value(&mut self, value: &Scalar) -> Result<bool, ContainerError>;

    /// Sort in place with the given comparator.
    fn sort(&mut self, cmp: ScalarComparator<'_>) -> Result<(), ContainerError>;

    /// The element handles in forward order.
    fn snapshot(&self) -> Vec<Scalar>;
}

/// Shared handle to an array container. Cloning shares the backing;
/// identity compares the allocation.
#[derive(Clone)]
pub struct ArrayRef(Arc<RwLock<dyn ScalarArray>>);

impl ArrayRef {
    /// Wrap a backing in a shared handle.
    pub fn new(array: impl ScalarArray + 'static) -> ArrayRef {
        ArrayRef(Arc::new(RwLock::new(array)))
    }

    /// Read access to the backing.
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, dyn ScalarArray> {
        self.0.read()
    }

    /// Write access to the backing.
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, dyn ScalarArray> {
        self.0.write()
    }

    /// Reference identity of the backing allocation.
    pub fn ptr_eq(&self, other: &ArrayRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ArrayRef(len={})", self.0.read().len())
    }
}

/// The growable default backing.
#[derive(Debug, Default)]
pub struct VecArray {
    items: Vec<Scalar>,
}

impl VecArray {
    /// An empty growable array.
    pub fn new() -> VecArray {
        VecArray { items: Vec::new() }
    }

    /// A growable array seeded with elements.
    pub fn from_values(items: Vec<Scalar>) -> VecArray {
        VecArray { items }
    }
}

impl ScalarArray for VecArray {
    fn push(&mut self, value: Scalar) -> Result<Scalar, ContainerError> {
        self.items.push(value.clone());
        Ok(value)
    }

    fn pop(&mut self) -> Result<Scalar, ContainerError> {
        self.items.pop().ok_or(ContainerError::Underflow)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&mut self, index: usize) -> Result<Scalar, ContainerError> {
        while self.items.len() <= index {
            self.items.push(Scalar::empty());
        }
        Ok(self.items[index].clone())
    }

    fn insert(&mut self, index: usize, value: Scalar) -> Result<(), ContainerError> {
        while self.items.len() < index {
            self.items.push(Scalar::empty());
        }
        self.items.insert(index, value);
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> Result<Scalar, ContainerError> {
        if index >= self.items.len() {
            return Err(ContainerError::OutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    fn remove_value(&mut self, value: &Scalar) -> Result<bool, ContainerError> {
        if let Some(pos) = self.items.iter().position(|item| item.structural_eq(value)) {
            self.items.remove(pos);
            return Ok(true);
        }
        Ok(false)
    }

    fn sort(&mut self, cmp: ScalarComparator<'_>) -> Result<(), ContainerError> {
        self.items.sort_by(|a, b| cmp(a, b));
        Ok(())
    }

    fn snapshot(&self) -> Vec<Scalar> {
        self.items.clone()
    }
}

/// An O(1) sub-range view over a shared backing array.
///
/// The view's length is fixed at creation; pushes insert at the view's end
/// inside the backing, pops remove the view's last element. Out-of-range
/// reads are errors - a bounded view never auto-extends.
#[derive(Debug)]
pub struct ViewArray {
    backing: ArrayRef,
    offset: usize,
    len: usize,
}

impl ViewArray {
    /// View `len` elements of `backing` starting at `offset`.
    pub fn new(backing: ArrayRef, offset: usize, len: usize) -> ViewArray {
        ViewArray {
            backing,
            offset,
            len,
        }
    }
}

impl ScalarArray for ViewArray {
    fn push(&mut self, value: Scalar) -> Result<Scalar, ContainerError> {
        self.backing
            .write()
            .insert(self.offset + self.len, value.clone())?;
        self.len += 1;
        Ok(value)
    }

    fn pop(&mut self) -> Result<Scalar, ContainerError> {
        if self.len == 0 {
            return Err(ContainerError::Underflow);
        }
        let value = self.backing.write().remove_at(self.offset + self.len - 1)?;
        self.len -= 1;
        Ok(value)
    }

    fn len(&self) -> usize {
        self.len
    }

    fn get(&mut self, index: usize) -> Result<Scalar, ContainerError> {
        if index >= self.len {
            return Err(ContainerError::OutOfRange {
                index,
                len: self.len,
            });
        }
        self.backing.write().get(self.offset + index)
    }

    fn insert(&mut self, index: usize, value: Scalar) -> Result<(), ContainerError> {
        if index > self.len {
            return Err(ContainerError::OutOfRange {
                index,
                len: self.len,
            });
        }
        self.backing.write().insert(self.offset + index, value)?;
        self.len += 1;
        Ok(())
    }

    fn remove_at(&mut self, index: usize) -> Result<Scalar, ContainerError> {
        if index >= self.len {
            return Err(ContainerError::OutOfRange {
                index,
                len: self.len,
            });
        }
        let value = self.backing.write().remove_at(self.offset + index)?;
        self.len -= 1;
        Ok(value)
    }

    fn remove_value(&mut self, value: &Scalar) -> Result<bool, ContainerError> {
        let mut backing = self.backing.write();
        for index in 0..self.len {
            let item = backing.get(self.offset + index)?;
            if item.structural_eq(value) {
                backing.remove_at(self.offset + index)?;
                drop(backing);
                self.len -= 1;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn sort(&mut self, cmp: ScalarComparator<'_>) -> Result<(), ContainerError> {
        let mut backing = self.backing.write();
        let mut slice = Vec::with_capacity(self.len);
        for index in 0..self.len {
            slice.push(backing.get(self.offset + index)?);
        }
        slice.sort_by(|a, b| cmp(a, b));
        for (index, value) in slice.into_iter().enumerate() {
            let target = backing.get(self.offset + index)?;
            target.set_from(&value);
        }
        Ok(())
    }

    fn snapshot(&self) -> Vec<Scalar> {
        let mut backing = self.backing.write();
        let mut items = Vec::with_capacity(self.len);
        for index in 0..self.len {
            if let Ok(item) = backing.get(self.offset + index) {
                items.push(item);
            }
        }
        items
    }
}

/// A read-only wrapper over a host-supplied collection.
///
/// Every mutator fails with [`ContainerError::ReadOnly`]; reads past the
/// end fail the same way because the wrapper cannot auto-extend.
#[derive(Debug)]
pub struct ReadOnlyArray {
    items: Vec<Scalar>,
}

impl ReadOnlyArray {
    /// Wrap a host collection.
    pub fn new(items: Vec<Scalar>) -> ReadOnlyArray {
        ReadOnlyArray { items }
    }
}

impl ScalarArray for ReadOnlyArray {
    fn push(&mut self, _value: Scalar) -> Result<Scalar, ContainerError> {
        Err(ContainerError::ReadOnly)
    }

    fn pop(&mut self) -> Result<Scalar, ContainerError> {
        Err(ContainerError::ReadOnly)
    }

    fn len(&self) -> usize {
        self.items.len()
    }

    fn get(&mut self, index: usize) -> Result<Scalar, ContainerError> {
        self.items
            .get(index)
            .cloned()
            .ok_or(ContainerError::ReadOnly)
    }

    fn insert(&mut self, _index: usize, _value: Scalar) -> Result<(), ContainerError> {
        Err(ContainerError::ReadOnly)
    }

    fn remove_at(&mut self, _index: usize) -> Result<Scalar, ContainerError> {
        Err(ContainerError::ReadOnly)
    }

    fn remove_value(&mut self, _value: &Scalar) -> Result<bool, ContainerError> {
        Err(ContainerError::ReadOnly)
    }

    fn sort(&mut self, _cmp: ScalarComparator<'_>) -> Result<(), ContainerError> {
        Err(ContainerError::ReadOnly)
    }

    fn snapshot(&self) -> Vec<Scalar> {
        self.items.clone()
    }
}
