//! The per-instance script environment.
//!
//! Holds the runtime state evaluation threads through: the frame pool, the
//! pending flow-control cell, continuation contexts accumulated while a
//! yield unwinds, the flagged-error side channel, and dispatch profiling.

use rustc_hash::FxHashMap;

use siesta_ir::{BlockRef, FlowKind};
use siesta_value::Scalar;

use crate::frame::FrameStack;

/// A pending flow-control request: the kind and the value it carries.
#[derive(Clone, Debug)]
pub struct FlowRequest {
    /// What was requested.
    pub kind: FlowKind,
    /// The carried value; the empty scalar when the request had none.
    pub value: Scalar,
}

/// Mutable evaluation state owned by one script instance.
///
/// Lifetime matches the owning instance; forked siblings get their own.
#[derive(Debug, Default)]
pub struct ScriptEnvironment {
    frames: FrameStack,
    flow: Option<FlowRequest>,
    pending: Vec<(BlockRef, usize)>,
    flagged: Option<String>,
    profile: FxHashMap<String, u64>,
}

impl ScriptEnvironment {
    /// A fresh environment.
    pub fn new() -> ScriptEnvironment {
        ScriptEnvironment::default()
    }

    /// The frame pool.
    pub fn frames(&mut self) -> &mut FrameStack {
        &mut self.frames
    }

    /// Kind of the pending flow request, if any.
    pub fn flow_kind(&self) -> Option<FlowKind> {
        self.flow.as_ref().map(|f| f.kind)
    }

    /// Request flow control. A request set while another is pending
    /// replaces it; steps only set flow when none is pending.
    pub fn set_flow(&mut self, kind: FlowKind, value: Scalar) {
        self.flow = Some(FlowRequest { kind, value });
    }

    /// Consume the pending request.
    pub fn take_flow(&mut self) -> Option<FlowRequest> {
        self.flow.take()
    }

    /// Drop the pending request, as a loop does for break/continue.
    pub fn clear_flow(&mut self) {
        self.flow = None;
    }

    /// Record a resume point while a yield unwinds. Contexts accumulate
    /// innermost first.
    pub fn push_context(&mut self, block: BlockRef, resume_at: usize) {
        self.pending.push((block, resume_at));
    }

    /// Take the contexts accumulated since the last capture, innermost
    /// first. The closure boundary stores them on the closure instance.
    pub fn take_contexts(&mut self) -> Vec<(BlockRef, usize)> {
        std::mem::take(&mut self.pending)
    }

    /// Flag a cooperative error for [`ScriptEnvironment::check_error`].
    pub fn flag_error(&mut self, message: impl Into<String>) {
        self.flagged = Some(message.into());
    }

    /// Read and clear the flagged error.
    pub fn check_error(&mut self) -> Option<String> {
        self.flagged.take()
    }

    /// Count a dispatch for profiling.
    pub fn profile_hit(&mut self, name: &str) {
        *self.profile.entry(name.to_owned()).or_insert(0) += 1;
    }

    /// Dispatch counts collected so far, by name.
    pub fn profile(&self) -> &FxHashMap<String, u64> {
        &self.profile
    }
}
