//! Argument frames and the frame pool.
//!
//! Frames pass argument lists between steps and into dispatched
//! implementations. The pool is a stack-of-stacks: `create_frame` activates
//! the next pooled frame, `take_frame`/`kill_frame` deactivate it. Steps
//! that build an argument list create a frame first and consume it after
//! dispatch; unbalanced use means the engine itself is broken, so the pool
//! fails loudly rather than limping on with corrupted state.
//!
//! Arguments are pushed in declaration order, which makes pop order
//! rightmost-declared first. Argument-processing utilities rely on that.

use smallvec::SmallVec;

use siesta_value::Scalar;

/// One argument-list stack.
///
/// Dispatched implementations receive the frame directly, not a copy, and
/// are free to drain it.
#[derive(Debug, Default)]
pub struct Frame {
    values: SmallVec<[Scalar; 8]>,
}

impl Frame {
    /// An empty frame outside the pool, for embedder-built argument lists.
    pub fn new() -> Frame {
        Frame::default()
    }

    /// A frame seeded with arguments in declaration order.
    pub fn from_values(values: impl IntoIterator<Item = Scalar>) -> Frame {
        Frame {
            values: values.into_iter().collect(),
        }
    }

    /// Push a value on top.
    pub fn push(&mut self, value: Scalar) {
        self.values.push(value);
    }

    /// Pop the top value: the rightmost-declared argument still present.
    pub fn pop(&mut self) -> Option<Scalar> {
        self.values.pop()
    }

    /// Pop, treating an exhausted frame as the empty scalar.
    pub fn pop_or_empty(&mut self) -> Scalar {
        self.values.pop().unwrap_or_else(Scalar::empty)
    }

    /// Number of values present.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the frame is drained.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The values in declaration order, without consuming them.
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    /// Drain every value in declaration order (leftmost first).
    pub fn drain_all(&mut self) -> impl Iterator<Item = Scalar> + '_ {
        self.values.drain(..)
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// The frame pool: a stack of frames addressed by a live index that
/// increments on create and decrements on take/kill.
#[derive(Debug, Default)]
pub struct FrameStack {
    frames: Vec<Frame>,
    live: usize,
}

impl FrameStack {
    /// An empty pool.
    pub fn new() -> FrameStack {
        FrameStack::default()
    }

    /// Number of live frames.
    pub fn depth(&self) -> usize {
        self.live
    }

    /// Activate the next frame, reusing pooled storage when available.
    pub fn create_frame(&mut self) {
        if self.live == self.frames.len() {
            self.frames.push(Frame::default());
        }
        self.frames[self.live].clear();
        self.live += 1;
    }

    /// The current (top) frame.
    ///
    /// # Panics
    /// Panics when no frame is live; that is an engine bug, not a script
    /// fault.
    pub fn current(&mut self) -> &mut Frame {
        assert!(self.live > 0, "frame discipline violated: no live frame");
        &mut self.frames[self.live - 1]
    }

    /// Deactivate the current frame, moving its contents out for dispatch.
    ///
    /// # Panics
    /// Panics when no frame is live.
    pub fn take_frame(&mut self) -> Frame {
        assert!(
            self.live > 0,
            "frame discipline violated: take without create"
        );
        self.live -= 1;
        Frame {
            values: std::mem::take(&mut self.frames[self.live].values),
        }
    }

    /// Deactivate and discard the current frame.
    ///
    /// # Panics
    /// Panics when no frame is live.
    pub fn kill_frame(&mut self) {
        assert!(
            self.live > 0,
            "frame discipline violated: kill without create"
        );
        self.live -= 1;
        self.frames[self.live].clear();
    }

    /// Discard frames down to a recorded depth. This is the sanctioned path
    /// for a loop break to drop partially built operand state.
    pub fn unwind_to(&mut self, depth: usize) {
        assert!(
            depth <= self.live,
            "frame discipline violated: unwind past live depth"
        );
        while self.live > depth {
            self.kill_frame();
        }
    }
}
