//! The environment registry: names to implementations.
//!
//! Bridges register implementations under string keys in one of five roles:
//! functions (`&name` invocation), operators (infix/prefix tokens),
//! predicates (named boolean tests), and the two binder roles invoked when
//! script source declares a subroutine under a registered keyword. Host
//! classes for object interop register here too.
//!
//! A registry is an explicit constructed object - there is no process-wide
//! static state - and is optionally shared across script instances.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use siesta_ir::BlockRef;
use siesta_value::Scalar;

use crate::context::ScriptContext;
use crate::errors::{EvalError, EvalResult};
use crate::frame::Frame;
use crate::interop::HostClass;

/// Implementation of `&name(...)` invocations.
pub trait Function: Send + Sync {
    /// Evaluate a call. `args` is the caller's frame, drained freely;
    /// pop order is rightmost-declared argument first.
    fn evaluate(&self, name: &str, ctx: &mut ScriptContext<'_>, args: &mut Frame) -> EvalResult;
}

/// Implementation of infix/prefix operator tokens.
pub trait Operator: Send + Sync {
    /// Apply the operator to the operands on `args`.
    fn operate(&self, symbol: &str, ctx: &mut ScriptContext<'_>, args: &mut Frame) -> EvalResult;
}

/// Implementation of named boolean tests used by check chains.
pub trait Predicate: Send + Sync {
    /// Decide the test against the operands on `args`.
    fn decide(
        &self,
        name: &str,
        ctx: &mut ScriptContext<'_>,
        args: &mut Frame,
    ) -> Result<bool, EvalError>;
}

/// Binder invoked when source declares a named subroutine under a
/// registered keyword.
pub trait Binder: Send + Sync {
    /// Bind `name` to `body` under `keyword`.
    fn bind_function(
        &self,
        ctx: &mut ScriptContext<'_>,
        keyword: &str,
        name: &str,
        body: &BlockRef,
    ) -> Result<(), EvalError>;
}

/// Binder invoked when source declares an event-filtered subroutine.
pub trait FilterBinder: Send + Sync {
    /// Bind `name` with `parameter` to `body` under `keyword`.
    fn bind_filtered_function(
        &self,
        ctx: &mut ScriptContext<'_>,
        keyword: &str,
        name: &str,
        parameter: &Scalar,
        body: &BlockRef,
    ) -> Result<(), EvalError>;
}

#[derive(Default)]
struct RegistryMaps {
    functions: FxHashMap<String, Arc<dyn Function>>,
    operators: FxHashMap<String, Arc<dyn Operator>>,
    predicates: FxHashMap<String, Arc<dyn Predicate>>,
    binders: FxHashMap<String, Arc<dyn Binder>>,
    filter_binders: FxHashMap<String, Arc<dyn FilterBinder>>,
    classes: FxHashMap<String, Arc<dyn HostClass>>,
}

struct RegistryInner {
    maps: RwLock<RegistryMaps>,
    /// Runtime-unique closure display ids, wrapping on overflow.
    closure_ids: AtomicU32,
}

/// Shared name-to-implementation registry.
///
/// Cloning shares the registry; forked instances hold the same one.
#[derive(Clone)]
pub struct SharedRegistry {
    inner: Arc<RegistryInner>,
}

impl SharedRegistry {
    /// An empty registry.
    pub fn new() -> SharedRegistry {
        SharedRegistry {
            inner: Arc::new(RegistryInner {
                maps: RwLock::new(RegistryMaps::default()),
                closure_ids: AtomicU32::new(1),
            }),
        }
    }

    /// A registry pre-loaded with the core operator/predicate bridge.
    pub fn with_core() -> SharedRegistry {
        let registry = SharedRegistry::new();
        crate::ops::register_core(&registry);
        registry
    }

    /// Register a function under `name`.
    pub fn register_function(&self, name: impl Into<String>, function: Arc<dyn Function>) {
        self.inner.maps.write().functions.insert(name.into(), function);
    }

    /// Register an operator under `symbol`.
    pub fn register_operator(&self, symbol: impl Into<String>, operator: Arc<dyn Operator>) {
        self.inner.maps.write().operators.insert(symbol.into(), operator);
    }

    /// Register a predicate under `name`.
    pub fn register_predicate(&self, name: impl Into<String>, predicate: Arc<dyn Predicate>) {
        self.inner.maps.write().predicates.insert(name.into(), predicate);
    }

    /// Register a binder under `keyword`.
    pub fn register_binder(&self, keyword: impl Into<String>, binder: Arc<dyn Binder>) {
        self.inner.maps.write().binders.insert(keyword.into(), binder);
    }

    /// Register a filter binder under `keyword`.
    pub fn register_filter_binder(
        &self,
        keyword: impl Into<String>,
        binder: Arc<dyn FilterBinder>,
    ) {
        self.inner
            .maps
            .write()
            .filter_binders
            .insert(keyword.into(), binder);
    }

    /// Register a host class under its name.
    pub fn register_class(&self, name: impl Into<String>, class: Arc<dyn HostClass>) {
        self.inner.maps.write().classes.insert(name.into(), class);
    }

    /// The function registered under `name`.
    pub fn find_function(&self, name: &str) -> Option<Arc<dyn Function>> {
        self.inner.maps.read().functions.get(name).cloned()
    }

    /// The operator registered under `symbol`.
    pub fn find_operator(&self, symbol: &str) -> Option<Arc<dyn Operator>> {
        self.inner.maps.read().operators.get(symbol).cloned()
    }

    /// The predicate registered under `name`.
    pub fn find_predicate(&self, name: &str) -> Option<Arc<dyn Predicate>> {
        self.inner.maps.read().predicates.get(name).cloned()
    }

    /// The binder registered under `keyword`.
    pub fn find_binder(&self, keyword: &str) -> Option<Arc<dyn Binder>> {
        self.inner.maps.read().binders.get(keyword).cloned()
    }

    /// The filter binder registered under `keyword`.
    pub fn find_filter_binder(&self, keyword: &str) -> Option<Arc<dyn FilterBinder>> {
        self.inner.maps.read().filter_binders.get(keyword).cloned()
    }

    /// The host class registered under `name`.
    pub fn find_class(&self, name: &str) -> Option<Arc<dyn HostClass>> {
        self.inner.maps.read().classes.get(name).cloned()
    }

    /// Next closure display id.
    pub(crate) fn next_closure_id(&self) -> u32 {
        self.inner.closure_ids.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for SharedRegistry {
    fn default() -> Self {
        Self::new()
    }
}
