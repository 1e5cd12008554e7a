//! Hash containers: the `ScalarHash` capability and its default backing.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::scalar::Scalar;

/// Map from string keys to scalars.
///
/// Keys are derived from a scalar's stringified value. `get` auto-vivifies
/// an empty entry on miss - get-or-create semantics mirroring array
/// auto-extension - so merely reading a never-seen key is an observable
/// side effect. `keys` lazily prunes entries whose value is still the
/// untouched empty sentinel before returning the live key set.
pub trait ScalarHash: Send + Sync + fmt::Debug {
    /// Entry handle for `key`, creating an empty entry on miss.
    fn get(&mut self, key: &str) -> Scalar;

    /// Entry handle for `key` without creating one.
    fn peek(&self, key: &str) -> Option<Scalar>;

    /// Remove the entry for `key`, returning its value.
    fn remove_key(&mut self, key: &str) -> Option<Scalar>;

    /// Remove the first entry whose value structurally matches `value`.
    /// Returns whether anything was removed.
    fn remove_value(&mut self, value: &Scalar) -> bool;

    /// The live key set, after pruning still-empty entries.
    fn keys(&mut self) -> Vec<String>;

    /// Number of entries, including not-yet-pruned empty ones.
    fn len(&self) -> usize;

    /// Whether the hash has no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The (key, value-handle) pairs currently stored.
    fn snapshot(&self) -> Vec<(String, Scalar)>;
}

/// Shared handle to a hash container. Cloning shares the backing;
/// identity compares the allocation.
#[derive(Clone)]
pub struct HashRef(Arc<RwLock<dyn ScalarHash>>);

impl HashRef {
    /// Wrap a backing in a shared handle.
    pub fn new(hash: impl ScalarHash + 'static) -> HashRef {
        HashRef(Arc::new(RwLock::new(hash)))
    }

    /// Read access to the backing.
    pub fn read(&self) -> parking_lot::RwLockReadGuard<'_, dyn ScalarHash> {
        self.0.read()
    }

    /// Write access to the backing.
    pub fn write(&self) -> parking_lot::RwLockWriteGuard<'_, dyn ScalarHash> {
        self.0.write()
    }

    /// Reference identity of the backing allocation.
    pub fn ptr_eq(&self, other: &HashRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for HashRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashRef(len={})", self.0.read().len())
    }
}

/// The default map-backed hash.
#[derive(Debug, Default)]
pub struct MapHash {
    entries: FxHashMap<String, Scalar>,
}

impl MapHash {
    /// An empty hash.
    pub fn new() -> MapHash {
        MapHash {
            entries: FxHashMap::default(),
        }
    }
}

impl ScalarHash for MapHash {
    fn get(&mut self, key: &str) -> Scalar {
        if let Some(value) = self.entries.get(key) {
            return value.clone();
        }
        let value = Scalar::empty();
        self.entries.insert(key.to_owned(), value.clone());
        value
    }

    fn peek(&self, key: &str) -> Option<Scalar> {
        self.entries.get(key).cloned()
    }

    fn remove_key(&mut self, key: &str) -> Option<Scalar> {
        self.entries.remove(key)
    }

    fn remove_value(&mut self, value: &Scalar) -> bool {
        let key = self
            .entries
            .iter()
            .find(|(_, v)| v.structural_eq(value))
            .map(|(k, _)| k.clone());
        match key {
            Some(key) => {
                self.entries.remove(&key);
                true
            }
            None => false,
        }
    }

    fn keys(&mut self) -> Vec<String> {
        self.entries.retain(|_, value| !value.is_empty());
        self.entries.keys().cloned().collect()
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn snapshot(&self) -> Vec<(String, Scalar)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}
