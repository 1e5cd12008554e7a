//! Script instances: a compiled block, its environment, and its scopes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

use siesta_diagnostic::{DebugFlags, ScriptWarning, WarningWatcher};
use siesta_ir::{BlockRef, FlowKind};
use siesta_value::Scalar;

use crate::context::ScriptContext;
use crate::environment::ScriptEnvironment;
use crate::errors::{EvalError, EvalResult};
use crate::frame::Frame;
use crate::registry::SharedRegistry;
use crate::variables::ScriptVariables;

pub(crate) struct InstanceShared {
    name: String,
    block: BlockRef,
    registry: SharedRegistry,
    variables: Arc<ScriptVariables>,
    loaded: AtomicBool,
    watchers: RwLock<Vec<Arc<dyn WarningWatcher>>>,
    debug: RwLock<DebugFlags>,
    env: Mutex<ScriptEnvironment>,
}

/// A runnable script: name, root block, environment, and variable chain.
///
/// Cloning yields another handle to the same instance. [`ScriptInstance::fork`]
/// creates a *sibling* instance instead: same registry and global scope,
/// isolated frames and local scopes, suitable for running on its own thread.
///
/// Once [`ScriptInstance::set_unloaded`] is called the instance is
/// permanently inert: runs and closure invocations fail, and cooperative
/// loops exit at their next iteration boundary.
#[derive(Clone)]
pub struct ScriptInstance {
    pub(crate) shared: Arc<InstanceShared>,
}

impl ScriptInstance {
    /// Tie a compiled block to a registry, with fresh variables.
    pub fn new(name: impl Into<String>, block: BlockRef, registry: SharedRegistry) -> ScriptInstance {
        ScriptInstance {
            shared: Arc::new(InstanceShared {
                name: name.into(),
                block,
                registry,
                variables: Arc::new(ScriptVariables::new()),
                loaded: AtomicBool::new(true),
                watchers: RwLock::new(Vec::new()),
                debug: RwLock::new(DebugFlags::default()),
                env: Mutex::new(ScriptEnvironment::new()),
            }),
        }
    }

    pub(crate) fn from_shared(shared: Arc<InstanceShared>) -> ScriptInstance {
        ScriptInstance { shared }
    }

    pub(crate) fn downgrade(&self) -> Weak<InstanceShared> {
        Arc::downgrade(&self.shared)
    }

    /// The script's name, as warnings report it.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    /// The root block.
    pub fn root_block(&self) -> &BlockRef {
        &self.shared.block
    }

    /// The shared registry.
    pub fn registry(&self) -> SharedRegistry {
        self.shared.registry.clone()
    }

    /// The instance's variable chain.
    pub fn variables(&self) -> Arc<ScriptVariables> {
        self.shared.variables.clone()
    }

    /// Whether the instance is still loaded.
    pub fn is_loaded(&self) -> bool {
        self.shared.loaded.load(Ordering::Acquire)
    }

    /// Mark the instance permanently inert.
    pub fn set_unloaded(&self) {
        self.shared.loaded.store(false, Ordering::Release);
    }

    /// Current debug flags.
    pub fn debug_flags(&self) -> DebugFlags {
        *self.shared.debug.read()
    }

    /// Replace the debug flags.
    pub fn set_debug_flags(&self, flags: DebugFlags) {
        *self.shared.debug.write() = flags;
    }

    /// Register a warning watcher.
    pub fn add_watcher(&self, watcher: Arc<dyn WarningWatcher>) {
        self.shared.watchers.write().push(watcher);
    }

    pub(crate) fn deliver(&self, warning: &ScriptWarning) {
        for watcher in self.shared.watchers.read().iter() {
            watcher.script_warning(warning);
        }
    }

    /// Run the root block to completion.
    ///
    /// A root-level return (including the `done`/`halt` shorthands) supplies
    /// the result; otherwise the result is the last step's produced value.
    pub fn run(&self) -> EvalResult {
        if !self.is_loaded() {
            return Err(EvalError::Unloaded {
                name: self.name().to_owned(),
            });
        }
        let mut env = self.shared.env.lock();
        let mut ctx = ScriptContext::new(self.clone(), &mut env);
        // A previous run that unwound on a fatal fault may have left a
        // stale request behind.
        ctx.env.clear_flow();
        let _ = ctx.env.take_contexts();
        let produced = ctx.eval_block(&self.shared.block)?;
        match ctx.env.take_flow() {
            Some(flow) if matches!(flow.kind, FlowKind::Return | FlowKind::Yield) => {
                // A top-level yield has no closure to suspend; it finishes
                // the run like a return.
                ctx.env.take_contexts();
                Ok(flow.value)
            }
            Some(flow) => {
                let line = self.shared.block.line_range().map_or(0, |(low, _)| low);
                ctx.advise(line, format!("misplaced {} outside of a loop", flow.kind));
                Ok(produced)
            }
            None => Ok(produced),
        }
    }

    /// Create a sibling instance sharing the registry and global scope but
    /// owning isolated frames and local scopes.
    pub fn fork(&self) -> ScriptInstance {
        ScriptInstance {
            shared: Arc::new(InstanceShared {
                name: self.shared.name.clone(),
                block: self.shared.block.clone(),
                registry: self.shared.registry.clone(),
                variables: Arc::new(self.shared.variables.shared_with()),
                loaded: AtomicBool::new(true),
                watchers: RwLock::new(self.shared.watchers.read().clone()),
                debug: RwLock::new(*self.shared.debug.read()),
                env: Mutex::new(ScriptEnvironment::new()),
            }),
        }
    }

    /// Fork and run the sibling on a new native thread.
    pub fn fork_spawn(&self) -> (ScriptInstance, std::thread::JoinHandle<EvalResult>) {
        let child = self.fork();
        let runner = child.clone();
        let handle = std::thread::spawn(move || runner.run());
        (child, handle)
    }

    /// Invoke a closure-holding scalar from outside any script context -
    /// the embedder's callback-delivery entry point.
    pub fn call_closure(
        &self,
        closure: &Scalar,
        message: &str,
        args: Vec<Scalar>,
    ) -> EvalResult {
        let mut env = self.shared.env.lock();
        let mut ctx = ScriptContext::new(self.clone(), &mut env);
        ctx.invoke_closure(closure, message, Frame::from_values(args))
    }

    /// Read and clear the flagged-error side channel.
    pub fn check_error(&self) -> Option<String> {
        self.shared.env.lock().check_error()
    }

    /// Dispatch counts collected under the trace/profile flags.
    pub fn profile_snapshot(&self) -> Vec<(String, u64)> {
        let env = self.shared.env.lock();
        let mut counts: Vec<(String, u64)> = env
            .profile()
            .iter()
            .map(|(name, count)| (name.clone(), *count))
            .collect();
        counts.sort();
        counts
    }
}

impl std::fmt::Debug for ScriptInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptInstance")
            .field("name", &self.shared.name)
            .field("loaded", &self.is_loaded())
            .finish_non_exhaustive()
    }
}
