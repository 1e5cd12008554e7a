//! Variable scoping: named-binding levels and the three-level chain.
//!
//! Lookup precedence is local (when active) -> closure (when active) ->
//! global, with the global level auto-creating bindings on fallback. At
//! most one local level and one closure level are active at any evaluation
//! instant; nested calls save and restore by pushing and popping, never by
//! overwriting.
//!
//! Instances sharing a global scope (a parent and its forked children)
//! serialize closure invocation on a single reentrant lock per sharing
//! group, held across scope-push/body-eval/scope-pop so pushes and pops
//! always pair up even under cross-thread invocation.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, ReentrantMutex, RwLock};
use rustc_hash::FxHashMap;

use siesta_value::Scalar;

/// A named-binding container.
///
/// Names carry their sigil (`$`/`@`/`%`) as part of the string; the three
/// namespaces share one map.
pub trait Variable: Send + Sync + fmt::Debug {
    /// Whether a binding exists.
    fn exists(&self, name: &str) -> bool;

    /// The bound scalar handle, if any.
    fn get(&self, name: &str) -> Option<Scalar>;

    /// Bind a scalar handle under a name.
    fn put(&mut self, name: &str, value: Scalar);

    /// Drop a binding.
    fn remove(&mut self, name: &str);
}

/// The default map-backed binding level.
#[derive(Debug, Default)]
pub struct VariableLevel {
    bindings: FxHashMap<String, Scalar>,
}

impl VariableLevel {
    /// An empty level.
    pub fn new() -> VariableLevel {
        VariableLevel::default()
    }

    /// Names bound at this level.
    pub fn names(&self) -> Vec<String> {
        self.bindings.keys().cloned().collect()
    }
}

impl Variable for VariableLevel {
    fn exists(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<Scalar> {
        self.bindings.get(name).cloned()
    }

    fn put(&mut self, name: &str, value: Scalar) {
        self.bindings.insert(name.to_owned(), value);
    }

    fn remove(&mut self, name: &str) {
        self.bindings.remove(name);
    }
}

/// Shared handle to one binding level.
pub type LevelRef = Arc<RwLock<VariableLevel>>;

/// A fresh empty level.
pub fn new_level() -> LevelRef {
    Arc::new(RwLock::new(VariableLevel::new()))
}

/// The three-level scope chain for one script instance.
pub struct ScriptVariables {
    global: LevelRef,
    locals: Mutex<Vec<LevelRef>>,
    closures: Mutex<Vec<LevelRef>>,
    guard: Arc<ReentrantMutex<()>>,
}

impl ScriptVariables {
    /// A fresh chain with its own global level and sharing-group lock.
    pub fn new() -> ScriptVariables {
        ScriptVariables {
            global: new_level(),
            locals: Mutex::new(Vec::new()),
            closures: Mutex::new(Vec::new()),
            guard: Arc::new(ReentrantMutex::new(())),
        }
    }

    /// A sibling chain for a forked instance: same global level and
    /// sharing-group lock, fresh (empty) local and closure stacks.
    pub fn shared_with(&self) -> ScriptVariables {
        ScriptVariables {
            global: self.global.clone(),
            locals: Mutex::new(Vec::new()),
            closures: Mutex::new(Vec::new()),
            guard: self.guard.clone(),
        }
    }

    /// The sharing-group lock serializing closure invocation.
    pub fn guard(&self) -> Arc<ReentrantMutex<()>> {
        self.guard.clone()
    }

    /// The global level.
    pub fn global(&self) -> LevelRef {
        self.global.clone()
    }

    /// Activate a local level.
    pub fn push_local(&self, level: LevelRef) {
        self.locals.lock().push(level);
    }

    /// Deactivate the current local level.
    ///
    /// # Panics
    /// Panics when no local level is active; push/pop pairing is an engine
    /// invariant.
    pub fn pop_local(&self) -> LevelRef {
        self.locals
            .lock()
            .pop()
            .unwrap_or_else(|| panic!("scope discipline violated: pop without local level"))
    }

    /// Activate a closure level.
    pub fn push_closure(&self, level: LevelRef) {
        self.closures.lock().push(level);
    }

    /// Deactivate the current closure level.
    ///
    /// # Panics
    /// Panics when no closure level is active.
    pub fn pop_closure(&self) -> LevelRef {
        self.closures
            .lock()
            .pop()
            .unwrap_or_else(|| panic!("scope discipline violated: pop without closure level"))
    }

    fn top_local(&self) -> Option<LevelRef> {
        self.locals.lock().last().cloned()
    }

    fn top_closure(&self) -> Option<LevelRef> {
        self.closures.lock().last().cloned()
    }

    /// Look a name up through the precedence chain.
    pub fn lookup(&self, name: &str) -> Option<Scalar> {
        if let Some(local) = self.top_local() {
            if let Some(value) = local.read().get(name) {
                return Some(value);
            }
        }
        if let Some(closure) = self.top_closure() {
            if let Some(value) = closure.read().get(name) {
                return Some(value);
            }
        }
        self.global.read().get(name)
    }

    /// Whether a name is bound anywhere in the chain.
    pub fn exists(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Bind into the active scope: the current local level when one is
    /// active, else the global level. Loop variables bind here.
    pub fn put_active(&self, name: &str, value: Scalar) {
        match self.top_local() {
            Some(local) => local.write().put(name, value),
            None => self.global.write().put(name, value),
        }
    }

    /// Bind at the global level, the auto-create fallback for first reads.
    pub fn put_global(&self, name: &str, value: Scalar) {
        self.global.write().put(name, value);
    }
}

impl Default for ScriptVariables {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ScriptVariables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptVariables")
            .field("locals", &self.locals.lock().len())
            .field("closures", &self.closures.lock().len())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn get_int(vars: &ScriptVariables, name: &str) -> Option<i32> {
        vars.lookup(name).map(|s| s.int_value())
    }

    #[test]
    fn local_shadows_global_until_popped() {
        let vars = ScriptVariables::new();
        vars.put_global("$x", Scalar::int(1));

        let level = new_level();
        level.write().put("$x", Scalar::int(2));
        vars.push_local(level);
        assert_eq!(get_int(&vars, "$x"), Some(2));

        vars.pop_local();
        assert_eq!(get_int(&vars, "$x"), Some(1));
    }

    #[test]
    fn closure_level_sits_between_local_and_global() {
        let vars = ScriptVariables::new();
        vars.put_global("$x", Scalar::int(1));

        let closure = new_level();
        closure.write().put("$x", Scalar::int(2));
        vars.push_closure(closure);
        assert_eq!(get_int(&vars, "$x"), Some(2));

        let local = new_level();
        local.write().put("$x", Scalar::int(3));
        vars.push_local(local);
        assert_eq!(get_int(&vars, "$x"), Some(3));

        vars.pop_local();
        vars.pop_closure();
        assert_eq!(get_int(&vars, "$x"), Some(1));
    }

    #[test]
    fn forked_chain_shares_global_only() {
        let vars = ScriptVariables::new();
        vars.put_global("$shared", Scalar::int(9));

        let fork = vars.shared_with();
        assert_eq!(get_int(&fork, "$shared"), Some(9));

        let local = new_level();
        local.write().put("$mine", Scalar::int(1));
        fork.push_local(local);
        assert_eq!(get_int(&vars, "$mine"), None);
        fork.pop_local();
    }

    #[test]
    #[should_panic(expected = "scope discipline violated")]
    fn unbalanced_pop_panics() {
        ScriptVariables::new().pop_local();
    }
}
